//! Parsed address types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Content namespace of an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Immutable content addressed by CID.
    Ipfs,
    /// Mutable names: peer IDs or DNSLink domains.
    Ipns,
}

impl Protocol {
    /// Parses the lowercase protocol name. Anything else is unsupported.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ipfs" => Some(Self::Ipfs),
            "ipns" => Some(Self::Ipns),
            _ => None,
        }
    }

    /// Returns the lowercase protocol name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipfs => "ipfs",
            Self::Ipns => "ipns",
        }
    }

    /// Human-readable name of the identifier this namespace expects.
    pub fn identifier_kind(&self) -> &'static str {
        match self {
            Self::Ipfs => "CID",
            Self::Ipns => "PeerID or DNSLink",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-supplied address split into its parts.
///
/// Any part may be absent: an empty value means nothing matched. The parts
/// are normalized on construction, so an empty identifier or path is stored
/// as `None` and a present path never carries surrounding whitespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpfsUriParts {
    /// `ipfs` or `ipns`, meaningful only alongside an identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    /// CID, peer ID or DNSLink name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Remainder after the identifier, including the leading `/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl IpfsUriParts {
    /// Builds a normalized triple.
    pub fn new(
        protocol: Option<Protocol>,
        identifier: Option<impl Into<String>>,
        path: Option<impl Into<String>>,
    ) -> Self {
        let identifier = identifier.map(Into::into).filter(|id| !id.is_empty());
        let path = path
            .map(Into::into)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Self {
            protocol,
            identifier,
            path,
        }
    }

    /// Returns the empty triple produced when nothing matched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true when no part was extracted.
    pub fn is_empty(&self) -> bool {
        self.protocol.is_none() && self.identifier.is_none() && self.path.is_none()
    }

    /// Returns the path, or `""` when absent.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    /// Returns the gateway-internal path `/<protocol>/<identifier><path>`.
    ///
    /// `None` unless both protocol and identifier are present. This does not
    /// validate the identifier.
    pub fn internal_path(&self) -> Option<String> {
        let protocol = self.protocol?;
        let identifier = self.identifier.as_deref()?;
        Some(format!("/{}/{}{}", protocol, identifier, self.path()))
    }
}
