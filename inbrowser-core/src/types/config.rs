//! Configuration record and its typed mutations.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::constants::{
    DEFAULT_DNS_JSON_RESOLVERS, DEFAULT_ENABLE_GATEWAY_PROVIDERS,
    DEFAULT_ENABLE_RECURSIVE_GATEWAYS, DEFAULT_ENABLE_WEB_TRANSPORT, DEFAULT_ENABLE_WSS,
    DEFAULT_GATEWAYS, DEFAULT_ROUTERS, DEV_DEBUG_FILTER, DEV_HOSTNAME_MARKERS,
};
use crate::error::{GatewayError, Result};
use crate::input;

// ═══════════════════════════════════════════════════════════════════════════════
// DNS RESOLVERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered mapping from DNS suffix to DNS-over-HTTPS resolver URL.
///
/// Serialized as a JSON object. Insertion order is kept on both sides so a
/// stored mapping reads back exactly as written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DnsResolvers(Vec<(String, String)>);

impl DnsResolvers {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts or replaces the resolver for `suffix`. A replaced entry keeps its position.
    pub fn insert(&mut self, suffix: impl Into<String>, url: impl Into<String>) {
        let suffix = suffix.into();
        let url = url.into();
        match self.0.iter_mut().find(|(s, _)| *s == suffix) {
            Some(entry) => entry.1 = url,
            None => self.0.push((suffix, url)),
        }
    }

    /// Returns the resolver URL for an exact suffix.
    pub fn get(&self, suffix: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(s, _)| s == suffix)
            .map(|(_, url)| url.as_str())
    }

    /// Iterates `(suffix, url)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, u)| (s.as_str(), u.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DnsResolvers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut resolvers = Self::new();
        for (suffix, url) in iter {
            resolvers.insert(suffix, url);
        }
        resolvers
    }
}

impl Serialize for DnsResolvers {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (suffix, url) in &self.0 {
            map.serialize_entry(suffix, url)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DnsResolvers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ResolversVisitor;

        impl<'de> Visitor<'de> for ResolversVisitor {
            type Value = DnsResolvers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of DNS suffix to resolver URL")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut resolvers = DnsResolvers::new();
                while let Some((suffix, url)) = access.next_entry::<String, String>()? {
                    resolvers.insert(suffix, url);
                }
                Ok(resolvers)
            }
        }

        deserializer.deserialize_map(ResolversVisitor)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// Retrieval settings shared by the config page, its parent window, and the
/// background worker.
///
/// One logical record exists per storage origin. The record is only durable
/// once written through the persisted store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    /// Recursive gateway base URLs, in preference order
    pub gateways: Vec<String>,
    /// Delegated router base URLs, in preference order
    pub routers: Vec<String>,
    /// DNS suffix → DNS-over-HTTPS resolver URL
    pub dns_json_resolvers: DnsResolvers,
    /// Fetch through the recursive gateways
    pub enable_recursive_gateways: bool,
    /// Fetch from HTTP gateway providers returned by routers
    pub enable_gateway_providers: bool,
    /// Fetch from secure WebSocket providers returned by routers
    pub enable_wss: bool,
    /// Fetch from WebTransport providers returned by routers
    pub enable_web_transport: bool,
    /// Log filter directives; empty disables debug output
    pub debug: String,
}

impl ConfigRecord {
    /// Checks that at least one retrieval method is enabled.
    pub fn validate(&self) -> Result<()> {
        if !self.has_retrieval_method() {
            return Err(GatewayError::InvalidConfig(
                "At least one of the following must be enabled: recursive gateways, gateway providers, wss, or webtransport.".into(),
            ));
        }
        Ok(())
    }

    /// True if any of the four retrieval toggles is on.
    pub fn has_retrieval_method(&self) -> bool {
        self.enable_recursive_gateways
            || self.enable_gateway_providers
            || self.enable_wss
            || self.enable_web_transport
    }

    /// Returns the JSON value stored for `field`.
    pub fn field_value(&self, field: ConfigField) -> Value {
        match field {
            ConfigField::Gateways => Value::from(self.gateways.clone()),
            ConfigField::Routers => Value::from(self.routers.clone()),
            ConfigField::DnsJsonResolvers => Value::Object(
                self.dns_json_resolvers
                    .iter()
                    .map(|(s, u)| (s.to_string(), Value::from(u)))
                    .collect(),
            ),
            ConfigField::EnableRecursiveGateways => Value::Bool(self.enable_recursive_gateways),
            ConfigField::EnableGatewayProviders => Value::Bool(self.enable_gateway_providers),
            ConfigField::EnableWss => Value::Bool(self.enable_wss),
            ConfigField::EnableWebTransport => Value::Bool(self.enable_web_transport),
            ConfigField::Debug => Value::from(self.debug.clone()),
        }
    }

    /// Replaces empty gateway, router, and resolver collections with the
    /// ones in `defaults`.
    pub fn fill_empty_collections(&mut self, defaults: &ConfigRecord) {
        if self.gateways.is_empty() {
            self.gateways = defaults.gateways.clone();
        }
        if self.routers.is_empty() {
            self.routers = defaults.routers.clone();
        }
        if self.dns_json_resolvers.is_empty() {
            self.dns_json_resolvers = defaults.dns_json_resolvers.clone();
        }
    }

    /// Applies one mutation in place.
    pub fn apply(&mut self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::Gateways(v) => self.gateways = v,
            ConfigUpdate::Routers(v) => self.routers = v,
            ConfigUpdate::DnsJsonResolvers(v) => self.dns_json_resolvers = v,
            ConfigUpdate::EnableRecursiveGateways(v) => self.enable_recursive_gateways = v,
            ConfigUpdate::EnableGatewayProviders(v) => self.enable_gateway_providers = v,
            ConfigUpdate::EnableWss(v) => self.enable_wss = v,
            ConfigUpdate::EnableWebTransport(v) => self.enable_web_transport = v,
            ConfigUpdate::Debug(v) => self.debug = v,
        }
    }
}

impl Default for ConfigRecord {
    fn default() -> Self {
        compute_defaults(&Environment::default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELDS & UPDATES
// ═══════════════════════════════════════════════════════════════════════════════

/// Closed set of configuration fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// `gateways`
    Gateways,
    /// `routers`
    Routers,
    /// `dnsJsonResolvers`
    DnsJsonResolvers,
    /// `enableRecursiveGateways`
    EnableRecursiveGateways,
    /// `enableGatewayProviders`
    EnableGatewayProviders,
    /// `enableWss`
    EnableWss,
    /// `enableWebTransport`
    EnableWebTransport,
    /// `debug`
    Debug,
}

impl ConfigField {
    /// Every field, in the order the store writes them.
    pub const ALL: [ConfigField; 8] = [
        ConfigField::Gateways,
        ConfigField::Routers,
        ConfigField::DnsJsonResolvers,
        ConfigField::EnableRecursiveGateways,
        ConfigField::EnableWss,
        ConfigField::EnableWebTransport,
        ConfigField::EnableGatewayProviders,
        ConfigField::Debug,
    ];

    /// Storage and wire key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigField::Gateways => "gateways",
            ConfigField::Routers => "routers",
            ConfigField::DnsJsonResolvers => "dnsJsonResolvers",
            ConfigField::EnableRecursiveGateways => "enableRecursiveGateways",
            ConfigField::EnableGatewayProviders => "enableGatewayProviders",
            ConfigField::EnableWss => "enableWss",
            ConfigField::EnableWebTransport => "enableWebTransport",
            ConfigField::Debug => "debug",
        }
    }
}

impl FromStr for ConfigField {
    type Err = GatewayError;

    fn from_str(key: &str) -> Result<Self> {
        ConfigField::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| GatewayError::UnknownField(key.to_string()))
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single typed mutation of the configuration record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigUpdate {
    /// Replace the recursive gateways.
    Gateways(Vec<String>),
    /// Replace the delegated routers.
    Routers(Vec<String>),
    /// Replace the DNS resolvers.
    DnsJsonResolvers(DnsResolvers),
    /// Toggle recursive gateways.
    EnableRecursiveGateways(bool),
    /// Toggle HTTP gateway providers.
    EnableGatewayProviders(bool),
    /// Toggle secure WebSocket providers.
    EnableWss(bool),
    /// Toggle WebTransport providers.
    EnableWebTransport(bool),
    /// Replace the debug filter.
    Debug(String),
}

impl ConfigUpdate {
    /// Field this update targets.
    pub fn field(&self) -> ConfigField {
        match self {
            ConfigUpdate::Gateways(_) => ConfigField::Gateways,
            ConfigUpdate::Routers(_) => ConfigField::Routers,
            ConfigUpdate::DnsJsonResolvers(_) => ConfigField::DnsJsonResolvers,
            ConfigUpdate::EnableRecursiveGateways(_) => ConfigField::EnableRecursiveGateways,
            ConfigUpdate::EnableGatewayProviders(_) => ConfigField::EnableGatewayProviders,
            ConfigUpdate::EnableWss(_) => ConfigField::EnableWss,
            ConfigUpdate::EnableWebTransport(_) => ConfigField::EnableWebTransport,
            ConfigUpdate::Debug(_) => ConfigField::Debug,
        }
    }

    /// Builds an update from a JSON value, rejecting values of the wrong shape.
    pub fn from_value(field: ConfigField, value: Value) -> Result<Self> {
        let invalid = |e: serde_json::Error| GatewayError::InvalidFieldValue {
            field: field.key().to_string(),
            reason: e.to_string(),
        };

        Ok(match field {
            ConfigField::Gateways => ConfigUpdate::Gateways(serde_json::from_value(value).map_err(invalid)?),
            ConfigField::Routers => ConfigUpdate::Routers(serde_json::from_value(value).map_err(invalid)?),
            ConfigField::DnsJsonResolvers => {
                ConfigUpdate::DnsJsonResolvers(serde_json::from_value(value).map_err(invalid)?)
            }
            ConfigField::EnableRecursiveGateways => {
                ConfigUpdate::EnableRecursiveGateways(serde_json::from_value(value).map_err(invalid)?)
            }
            ConfigField::EnableGatewayProviders => {
                ConfigUpdate::EnableGatewayProviders(serde_json::from_value(value).map_err(invalid)?)
            }
            ConfigField::EnableWss => ConfigUpdate::EnableWss(serde_json::from_value(value).map_err(invalid)?),
            ConfigField::EnableWebTransport => {
                ConfigUpdate::EnableWebTransport(serde_json::from_value(value).map_err(invalid)?)
            }
            ConfigField::Debug => ConfigUpdate::Debug(serde_json::from_value(value).map_err(invalid)?),
        })
    }

    /// Builds an update from the text form the config page uses.
    ///
    /// URL lists are newline-delimited, resolvers are newline-delimited
    /// `<suffix> <url>` pairs, toggles are `true`/`false`. List and resolver
    /// inputs are validated before conversion.
    pub fn from_input(field: ConfigField, text: &str) -> Result<Self> {
        Ok(match field {
            ConfigField::Gateways => {
                input::validate_url_input(text)?;
                ConfigUpdate::Gateways(input::url_input_to_list(text))
            }
            ConfigField::Routers => {
                input::validate_url_input(text)?;
                ConfigUpdate::Routers(input::url_input_to_list(text))
            }
            ConfigField::DnsJsonResolvers => {
                ConfigUpdate::DnsJsonResolvers(input::validate_dns_resolver_input(text)?)
            }
            ConfigField::EnableRecursiveGateways => {
                ConfigUpdate::EnableRecursiveGateways(input::parse_toggle(field, text)?)
            }
            ConfigField::EnableGatewayProviders => {
                ConfigUpdate::EnableGatewayProviders(input::parse_toggle(field, text)?)
            }
            ConfigField::EnableWss => ConfigUpdate::EnableWss(input::parse_toggle(field, text)?),
            ConfigField::EnableWebTransport => {
                ConfigUpdate::EnableWebTransport(input::parse_toggle(field, text)?)
            }
            ConfigField::Debug => ConfigUpdate::Debug(text.trim().to_string()),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// What default computation may know about the hosting page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    /// Hostname the config page is served from
    pub hostname: String,
}

impl Environment {
    /// Environment for a bare hostname.
    pub fn from_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    /// Environment for a page URL.
    pub fn from_page_url(page_url: &str) -> Result<Self> {
        let url = url::Url::parse(page_url)?;
        Ok(Self::from_hostname(url.host_str().unwrap_or_default()))
    }

    /// True on development and testing hosts.
    pub fn is_development(&self) -> bool {
        DEV_HOSTNAME_MARKERS
            .iter()
            .any(|marker| self.hostname.contains(marker))
    }
}

/// Computes the built-in defaults for an environment.
///
/// Only `debug` depends on the environment: development hosts get verbose
/// filters so nobody has to enable them by hand.
pub fn compute_defaults(env: &Environment) -> ConfigRecord {
    ConfigRecord {
        gateways: DEFAULT_GATEWAYS.iter().map(|s| s.to_string()).collect(),
        routers: DEFAULT_ROUTERS.iter().map(|s| s.to_string()).collect(),
        dns_json_resolvers: DEFAULT_DNS_JSON_RESOLVERS.iter().copied().collect(),
        enable_recursive_gateways: DEFAULT_ENABLE_RECURSIVE_GATEWAYS,
        enable_gateway_providers: DEFAULT_ENABLE_GATEWAY_PROVIDERS,
        enable_wss: DEFAULT_ENABLE_WSS,
        enable_web_transport: DEFAULT_ENABLE_WEB_TRANSPORT,
        debug: if env.is_development() {
            DEV_DEBUG_FILTER.to_string()
        } else {
            String::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults_production() {
        let config = compute_defaults(&Environment::from_hostname("inbrowser.link"));
        assert_eq!(config.gateways, vec!["https://trustless-gateway.link"]);
        assert_eq!(config.routers, vec!["https://delegated-ipfs.dev"]);
        assert_eq!(
            config.dns_json_resolvers.get("."),
            Some("https://delegated-ipfs.dev/dns-query")
        );
        assert!(config.enable_recursive_gateways);
        assert!(config.enable_gateway_providers);
        assert!(config.enable_wss);
        assert!(!config.enable_web_transport);
        assert_eq!(config.debug, "");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fill_empty_collections() {
        let defaults = ConfigRecord::default();
        let mut config = ConfigRecord {
            gateways: vec![],
            routers: vec!["https://r.example".into()],
            dns_json_resolvers: DnsResolvers::new(),
            enable_wss: false,
            ..ConfigRecord::default()
        };

        config.fill_empty_collections(&defaults);
        assert_eq!(config.gateways, defaults.gateways);
        assert_eq!(config.routers, vec!["https://r.example"]);
        assert_eq!(config.dns_json_resolvers, defaults.dns_json_resolvers);
        assert!(!config.enable_wss);
    }

    #[test_case("localhost" ; "localhost")]
    #[test_case("127.0.0.1" ; "loopback")]
    #[test_case("bafyabc.ipfs.inbrowser.dev" ; "dev subdomain")]
    fn test_defaults_development(hostname: &str) {
        let config = compute_defaults(&Environment::from_hostname(hostname));
        assert_eq!(config.debug, DEV_DEBUG_FILTER);
    }

    #[test]
    fn test_environment_from_page_url() {
        let env = Environment::from_page_url("http://localhost:3000/#/ipfs-sw-config").unwrap();
        assert_eq!(env.hostname, "localhost");
        assert!(env.is_development());
        assert!(Environment::from_page_url("not a url").is_err());
    }

    #[test]
    fn test_validate_requires_retrieval_method() {
        let mut config = ConfigRecord::default();
        config.enable_recursive_gateways = false;
        config.enable_gateway_providers = false;
        config.enable_wss = false;
        config.enable_web_transport = false;

        let err = config.validate().unwrap_err();
        assert!(err.is_validation_error());

        config.enable_web_transport = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_record_json_uses_camel_case_keys() {
        let json = serde_json::to_value(ConfigRecord::default()).unwrap();
        for field in ConfigField::ALL {
            assert!(json.get(field.key()).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_field_value_matches_record_json() {
        let config = ConfigRecord::default();
        let json = serde_json::to_value(&config).unwrap();
        for field in ConfigField::ALL {
            assert_eq!(&config.field_value(field), json.get(field.key()).unwrap());
        }
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("enableWss".parse::<ConfigField>().unwrap(), ConfigField::EnableWss);
        assert!(matches!(
            "enableWSS".parse::<ConfigField>(),
            Err(GatewayError::UnknownField(_))
        ));
    }

    #[test]
    fn test_update_from_value() {
        let update = ConfigUpdate::from_value(
            ConfigField::Gateways,
            serde_json::json!(["https://a.example", "https://b.example"]),
        )
        .unwrap();
        assert_eq!(update.field(), ConfigField::Gateways);

        let mut config = ConfigRecord::default();
        config.apply(update);
        assert_eq!(config.gateways, vec!["https://a.example", "https://b.example"]);

        let err = ConfigUpdate::from_value(ConfigField::EnableWss, serde_json::json!("yes")).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidFieldValue { .. }));
    }

    #[test]
    fn test_update_from_input() {
        let update = ConfigUpdate::from_input(
            ConfigField::DnsJsonResolvers,
            ". https://delegated-ipfs.dev/dns-query\n.eth https://eth.link/dns-query",
        )
        .unwrap();
        let ConfigUpdate::DnsJsonResolvers(resolvers) = update else {
            panic!("wrong variant");
        };
        assert_eq!(resolvers.len(), 2);
        assert_eq!(resolvers.get(".eth"), Some("https://eth.link/dns-query"));

        assert_eq!(
            ConfigUpdate::from_input(ConfigField::EnableWebTransport, "true").unwrap(),
            ConfigUpdate::EnableWebTransport(true)
        );
        assert!(ConfigUpdate::from_input(ConfigField::Gateways, "not a url").is_err());
    }

    #[test]
    fn test_dns_resolvers_keep_order() {
        let resolvers: DnsResolvers = [
            (".com", "https://cloudflare-dns.com/dns-query"),
            (".", "https://delegated-ipfs.dev/dns-query"),
            (".eth", "https://eth.link/dns-query"),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&resolvers).unwrap();
        let back: DnsResolvers = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = back.iter().map(|(s, _)| s).collect();
        assert_eq!(keys, vec![".com", ".", ".eth"]);
    }

    #[test]
    fn test_dns_resolvers_insert_replaces_in_place() {
        let mut resolvers = DnsResolvers::new();
        resolvers.insert(".", "https://a.example/dns-query");
        resolvers.insert(".eth", "https://b.example/dns-query");
        resolvers.insert(".", "https://c.example/dns-query");

        assert_eq!(resolvers.len(), 2);
        assert_eq!(resolvers.iter().next(), Some((".", "https://c.example/dns-query")));
    }
}
