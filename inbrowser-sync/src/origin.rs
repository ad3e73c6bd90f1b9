//! Parent origin discovery.
//!
//! A parent embedding the config page appends its own origin to the page's
//! fragment as a URL-encoded `origin` parameter, either after `@` or `&`:
//!
//! ```text
//! #/ipfs-sw-config@origin=https%3A%2F%2Fexample.ipfs.inbrowser.link
//! ```

use url::Url;

use inbrowser_core::constants::ORIGIN_FRAGMENT_PARAM;
use inbrowser_core::error::{GatewayError, Result};
use inbrowser_core::types::TargetOrigin;

/// Extracts the parent origin from a URL fragment (with or without `#`).
pub fn origin_from_fragment(fragment: &str) -> Result<TargetOrigin> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let prefix = format!("{ORIGIN_FRAGMENT_PARAM}=");

    let encoded = fragment
        .split(['@', '&'])
        .find_map(|segment| segment.strip_prefix(prefix.as_str()))
        .ok_or_else(|| {
            GatewayError::InvalidOrigin(format!("no '{ORIGIN_FRAGMENT_PARAM}' parameter in fragment"))
        })?;

    let decoded = urlencoding::decode(encoded)
        .map_err(|e| GatewayError::InvalidOrigin(format!("{encoded}: {e}")))?;

    TargetOrigin::parse(&decoded)
}

/// Extracts the parent origin from the config page's full URL.
pub fn parent_origin(page_url: &str) -> Result<TargetOrigin> {
    let url = Url::parse(page_url)?;
    let fragment = url
        .fragment()
        .ok_or_else(|| GatewayError::InvalidOrigin("page URL has no fragment".into()))?;
    origin_from_fragment(fragment)
}
