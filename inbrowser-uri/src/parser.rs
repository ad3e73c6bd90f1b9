//! Address parsing.
//!
//! Patterns are tried in order and the first structural match wins; a
//! matching pattern is never abandoned for a later one, even if what it
//! extracted turns out to be invalid.
//!
//! ```text
//! 1. path-style       .../ipfs/<id>/<path>      https://ipfs.io/ipns/docs.ipfs.tech/
//! 2. subdomain-style  <id>.ipfs.<domain>/<path> https://bafy....ipfs.dweb.link/a.txt
//! 3. native protocol  ipfs://<id>/<path>        ipns://k51qzi5uqu5d.../index.html
//! 4. bare CID         <cid>                     QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG
//! ```

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::trace;

use inbrowser_core::types::{IpfsUriParts, Protocol};

use crate::identifier::is_valid_cid;

fn path_regex() -> &'static Regex {
    static PATH_REGEX: OnceLock<Regex> = OnceLock::new();
    PATH_REGEX.get_or_init(|| {
        Regex::new(r"^.*?/(?P<protocol>ip[fn]s)/(?P<identifier>[^/?#]*)(?P<path>.*)$")
            .expect("path pattern is valid")
    })
}

fn subdomain_regex() -> &'static Regex {
    static SUBDOMAIN_REGEX: OnceLock<Regex> = OnceLock::new();
    SUBDOMAIN_REGEX.get_or_init(|| {
        Regex::new(
            r"^(?:https?://|//)?(?P<identifier>[^/]+)\.(?P<protocol>ip[fn]s)\.(?P<domain>[^/?#]*)(?P<path>.*)$",
        )
        .expect("subdomain pattern is valid")
    })
}

fn native_regex() -> &'static Regex {
    static NATIVE_REGEX: OnceLock<Regex> = OnceLock::new();
    NATIVE_REGEX.get_or_init(|| {
        Regex::new(r"^(?P<protocol>ip[fn]s)://(?P<identifier>[^/?#]*)(?P<path>.*)$")
            .expect("native protocol pattern is valid")
    })
}

/// Parses raw input into an address triple.
///
/// Never fails. Input matching no pattern and not decoding as a CID yields
/// the empty triple, which [`crate::validate_input`] reports to the user.
pub fn parse_input(input: &str) -> IpfsUriParts {
    let captures = path_regex()
        .captures(input)
        .or_else(|| subdomain_regex().captures(input))
        .or_else(|| native_regex().captures(input));

    if let Some(caps) = captures {
        return parts_from_captures(&caps);
    }

    if is_valid_cid(input) {
        trace!(input, "Input is a bare CID");
        return IpfsUriParts::new(Some(Protocol::Ipfs), Some(input), None::<String>);
    }

    trace!(input, "Input matched no address pattern");
    IpfsUriParts::empty()
}

fn parts_from_captures(caps: &Captures<'_>) -> IpfsUriParts {
    let protocol = caps.name("protocol").and_then(|m| Protocol::parse(m.as_str()));
    let identifier = caps.name("identifier").map(|m| m.as_str());
    // a bare trailing slash addresses the root, same as no path
    let path = caps
        .name("path")
        .map(|m| m.as_str().trim())
        .filter(|p| *p != "/");

    IpfsUriParts::new(protocol, identifier, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CID_V1: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
    const CID_V0: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    #[test]
    fn test_gateway_url_trailing_slash() {
        let parts = parse_input(&format!("https://ipfs.io/ipfs/{CID_V1}/"));
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.identifier.as_deref(), Some(CID_V1));
        assert_eq!(parts.path(), "");
    }

    #[test]
    fn test_unix_path() {
        let parts = parse_input(&format!("/ipfs/{CID_V0}/readme.md"));
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.identifier.as_deref(), Some(CID_V0));
        assert_eq!(parts.path(), "/readme.md");
    }

    #[test]
    fn test_ipns_path_keeps_dnslink_name() {
        let parts = parse_input("https://dweb.link/ipns/en.wikipedia-on-ipfs.org/wiki/Main_Page");
        assert_eq!(parts.protocol, Some(Protocol::Ipns));
        assert_eq!(parts.identifier.as_deref(), Some("en.wikipedia-on-ipfs.org"));
        assert_eq!(parts.path(), "/wiki/Main_Page");
    }

    #[test]
    fn test_path_style_uses_first_namespace_segment() {
        let parts = parse_input(&format!("/ipfs/{CID_V1}/docs/ipns/other"));
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.path(), "/docs/ipns/other");
    }

    #[test]
    fn test_path_keeps_query() {
        let parts = parse_input(&format!("/ipfs/{CID_V1}/file.car?format=car"));
        assert_eq!(parts.path(), "/file.car?format=car");
    }

    #[test]
    fn test_subdomain_gateway() {
        let parts = parse_input(&format!("https://{CID_V1}.ipfs.dweb.link/images/cat.png"));
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.identifier.as_deref(), Some(CID_V1));
        assert_eq!(parts.path(), "/images/cat.png");
    }

    #[test]
    fn test_subdomain_without_scheme() {
        let parts = parse_input("en-wikipedia--on--ipfs-org.ipns.inbrowser.link");
        assert_eq!(parts.protocol, Some(Protocol::Ipns));
        assert_eq!(parts.identifier.as_deref(), Some("en-wikipedia--on--ipfs-org"));
        assert_eq!(parts.path, None);
    }

    #[test]
    fn test_native_protocol() {
        let parts = parse_input(&format!("ipfs://{CID_V1}/index.html "));
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.identifier.as_deref(), Some(CID_V1));
        assert_eq!(parts.path(), "/index.html");

        let parts = parse_input("ipns://docs.ipfs.tech");
        assert_eq!(parts.protocol, Some(Protocol::Ipns));
        assert_eq!(parts.identifier.as_deref(), Some("docs.ipfs.tech"));
    }

    #[test]
    fn test_structural_match_without_identifier() {
        let parts = parse_input("https://ipfs.io/ipfs/");
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.identifier, None);
    }

    #[test]
    fn test_structural_match_does_not_fall_through() {
        // matches path-style with a bad identifier; must not be retried as a bare CID
        let parts = parse_input("/ipfs/not-a-cid");
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.identifier.as_deref(), Some("not-a-cid"));
    }

    #[test]
    fn test_bare_cid() {
        let parts = parse_input(CID_V0);
        assert_eq!(parts.protocol, Some(Protocol::Ipfs));
        assert_eq!(parts.identifier.as_deref(), Some(CID_V0));
        assert_eq!(parts.path, None);
    }

    #[test]
    fn test_no_match() {
        assert!(parse_input("").is_empty());
        assert!(parse_input("notaprotocol://x").is_empty());
        assert!(parse_input("https://example.com/index.html").is_empty());
    }

    proptest! {
        #[test]
        fn prop_path_style_extracts_rest(
            prefix in prop::sample::select(vec!["", "https://ipfs.io", "http://localhost:8080", "//gw.example"]),
            cid in prop::sample::select(vec![CID_V0, CID_V1]),
            rest in "[a-z0-9._-]{1,16}(/[a-z0-9._-]{1,16}){0,3}",
        ) {
            let parts = parse_input(&format!("{prefix}/ipfs/{cid}/{rest}"));
            prop_assert_eq!(parts.protocol, Some(Protocol::Ipfs));
            prop_assert_eq!(parts.identifier.as_deref(), Some(cid));
            let expected = format!("/{rest}");
            prop_assert_eq!(parts.path(), expected.trim());
        }

        #[test]
        fn prop_unmatched_input_is_empty(input in "[a-z]{1,20} [a-z]{1,20}") {
            prop_assert!(parse_input(&input).is_empty());
        }

        #[test]
        fn prop_never_panics(input in "\\PC{0,80}") {
            let parts = parse_input(&input);
            if let Some(path) = parts.path.as_deref() {
                prop_assert_eq!(path, path.trim());
            }
        }
    }
}
