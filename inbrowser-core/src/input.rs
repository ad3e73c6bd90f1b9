//! Text input conversions for configuration fields.
//!
//! The config page edits list fields as newline-delimited text and the
//! resolver map as newline-delimited `<suffix> <url>` pairs:
//!
//! ```text
//! . https://delegated-ipfs.dev/dns-query
//! .com https://cloudflare-dns.com/dns-query
//! .eth https://eth.link/dns-query
//! ```

use url::Url;

use crate::error::{GatewayError, Result};
use crate::types::{ConfigField, DnsResolvers};

const AT_LEAST_ONE_URL: &str = "At least one URL is required. Reset the config to use defaults.";

/// Splits newline-delimited text into URLs, dropping blank lines.
pub fn url_input_to_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Joins URLs into newline-delimited text.
pub fn list_to_url_input(urls: &[String]) -> String {
    urls.join("\n")
}

/// Parses `<suffix> <url>` lines. Lines without a URL map to an empty URL,
/// which [`validate_dns_resolver_input`] rejects.
pub fn dns_resolver_input_to_map(text: &str) -> DnsResolvers {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut parts = line.split_whitespace();
            let suffix = parts.next().unwrap_or_default();
            let url = parts.next().unwrap_or_default();
            (suffix.to_string(), url.to_string())
        })
        .collect()
}

/// Formats resolvers as `<suffix> <url>` lines.
pub fn dns_resolvers_to_input(resolvers: &DnsResolvers) -> String {
    resolvers
        .iter()
        .map(|(suffix, url)| format!("{suffix} {url}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validates newline-delimited URL input: at least one URL, every URL parses.
pub fn validate_url_input(text: &str) -> Result<()> {
    let urls = url_input_to_list(text);
    if urls.is_empty() {
        return Err(GatewayError::InvalidInput(AT_LEAST_ONE_URL.into()));
    }

    for (line, url) in urls.iter().enumerate() {
        if Url::parse(url).is_err() {
            return Err(GatewayError::InvalidInput(format!(
                "URL \"{url}\" on line {line} is not valid"
            )));
        }
    }

    Ok(())
}

/// Validates resolver input and returns the parsed mapping.
pub fn validate_dns_resolver_input(text: &str) -> Result<DnsResolvers> {
    let resolvers = dns_resolver_input_to_map(text);
    if resolvers.is_empty() {
        return Err(GatewayError::InvalidInput(AT_LEAST_ONE_URL.into()));
    }

    for (index, (suffix, url)) in resolvers.iter().enumerate() {
        if url.is_empty() {
            return Err(GatewayError::InvalidInput(format!(
                "Input on line {index} with key \"{suffix}\" is not valid"
            )));
        }
        if Url::parse(url).is_err() {
            return Err(GatewayError::InvalidInput(format!(
                "URL \"{url}\" at index {index} is not valid"
            )));
        }
    }

    Ok(resolvers)
}

/// Parses a toggle value.
pub fn parse_toggle(field: ConfigField, text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(GatewayError::InvalidFieldValue {
            field: field.key().to_string(),
            reason: format!("expected true or false, got '{other}'"),
        }),
    }
}
