//! Constants for the in-browser gateway.
//!
//! Built-in configuration defaults, storage identifiers, and the literal
//! strings that make up the cross-context message protocol.

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Recursive (trustless) gateways used when none are configured.
pub const DEFAULT_GATEWAYS: &[&str] = &["https://trustless-gateway.link"];

/// Delegated routers used when none are configured.
pub const DEFAULT_ROUTERS: &[&str] = &["https://delegated-ipfs.dev"];

/// DNS-over-HTTPS resolvers used when none are configured, as (suffix, url).
/// The `.` suffix matches every name.
pub const DEFAULT_DNS_JSON_RESOLVERS: &[(&str, &str)] =
    &[(".", "https://delegated-ipfs.dev/dns-query")];

/// Recursive gateways are enabled by default.
pub const DEFAULT_ENABLE_RECURSIVE_GATEWAYS: bool = true;

/// HTTP gateway providers returned by routers are enabled by default.
pub const DEFAULT_ENABLE_GATEWAY_PROVIDERS: bool = true;

/// Secure WebSocket providers are enabled by default.
pub const DEFAULT_ENABLE_WSS: bool = true;

/// WebTransport providers are disabled by default.
pub const DEFAULT_ENABLE_WEB_TRANSPORT: bool = false;

/// Debug filter applied on development hosts.
pub const DEV_DEBUG_FILTER: &str = "inbrowser=debug,inbrowser_sync=trace";

/// Hostname fragments that mark a development or testing environment.
pub const DEV_HOSTNAME_MARKERS: &[&str] = &["localhost", "inbrowser.dev", "127.0.0.1"];

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE
// ═══════════════════════════════════════════════════════════════════════════════

/// Database holding the configuration table.
pub const CONFIG_DATABASE: &str = "inbrowser-sw";

/// Table holding one entry per configuration field.
pub const CONFIG_TABLE: &str = "config";

// ═══════════════════════════════════════════════════════════════════════════════
// CROSS-CONTEXT MESSAGING
// ═══════════════════════════════════════════════════════════════════════════════

/// `source` of envelopes sent by an embedded config page.
pub const SOURCE_CONFIG_IFRAME: &str = "config-iframe";

/// `source` of envelopes sent by a top-level config page.
pub const SOURCE_CONFIG_PAGE: &str = "config-page";

/// `target` naming the parent window.
pub const TARGET_PARENT: &str = "PARENT";

/// `target` naming the background worker.
pub const TARGET_WORKER: &str = "SW";

/// The reload action understood by both the worker and the parent window.
pub const ACTION_RELOAD_CONFIG: &str = "RELOAD_CONFIG";

/// Fragment parameter through which a parent passes its own origin.
pub const ORIGIN_FRAGMENT_PARAM: &str = "origin";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists_not_empty() {
        assert!(!DEFAULT_GATEWAYS.is_empty());
        assert!(!DEFAULT_ROUTERS.is_empty());
        assert!(!DEFAULT_DNS_JSON_RESOLVERS.is_empty());
    }

    #[test]
    fn test_default_toggles_satisfy_invariant() {
        assert!(
            DEFAULT_ENABLE_RECURSIVE_GATEWAYS
                || DEFAULT_ENABLE_GATEWAY_PROVIDERS
                || DEFAULT_ENABLE_WSS
                || DEFAULT_ENABLE_WEB_TRANSPORT
        );
    }

    #[test]
    fn test_default_urls_parse() {
        for url in DEFAULT_GATEWAYS.iter().chain(DEFAULT_ROUTERS) {
            assert!(url::Url::parse(url).is_ok(), "{url}");
        }
        for (_, url) in DEFAULT_DNS_JSON_RESOLVERS {
            assert!(url::Url::parse(url).is_ok(), "{url}");
        }
    }
}
