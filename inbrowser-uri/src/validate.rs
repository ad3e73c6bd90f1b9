//! Address validation.

use thiserror::Error;
use tracing::debug;

use inbrowser_core::types::{IpfsUriParts, Protocol};

use crate::identifier::decode_cid;
use crate::parser::parse_input;

/// Shown when the input is not in any supported address format.
pub const FORMAT_HELP: &str = "Invalid address, correct it and try again. Supported formats:
  UNIX-like content path   /ipfs/cid/..
  HTTP gateway URL         https://ipfs.io/ipfs/cid..
  Native URL               ipfs://cid/..
Learn more at https://docs.ipfs.tech/how-to/address-ipfs-on-web";

/// Why an address cannot be navigated to. `Display` is the user-facing hint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Nothing was entered.
    #[error("Enter a valid IPFS/IPNS content path.")]
    MissingPath,

    /// No supported protocol could be identified.
    #[error("{}", FORMAT_HELP)]
    UnsupportedProtocol,

    /// The namespace is known but the identifier is missing.
    #[error("Content identifier missing. Add a {} to your path", .protocol.identifier_kind())]
    MissingIdentifier {
        /// Namespace that was recognized
        protocol: Protocol,
    },

    /// The identifier is not a decodable CID.
    #[error("Invalid CID")]
    InvalidIdentifier {
        /// Identifier as entered
        identifier: String,
        /// Decoder's reason
        reason: String,
    },
}

/// Validates a parsed address against the raw input it came from.
///
/// Checks short-circuit in a fixed order: missing path, unsupported protocol,
/// missing identifier, invalid CID. Only `ipfs` identifiers are decoded;
/// `ipns` names are resolved later by the worker.
///
/// Returns the gateway-internal path `/<protocol>/<identifier><path>`.
pub fn validate_input(request_path: &str, parts: &IpfsUriParts) -> Result<String, InputError> {
    if request_path.is_empty() {
        return Err(InputError::MissingPath);
    }

    let Some(protocol) = parts.protocol else {
        return Err(InputError::UnsupportedProtocol);
    };

    let Some(identifier) = parts.identifier.as_deref().filter(|id| !id.is_empty()) else {
        return Err(InputError::MissingIdentifier { protocol });
    };

    if protocol == Protocol::Ipfs {
        if let Err(e) = decode_cid(identifier) {
            debug!(identifier, error = %e, "Rejected identifier");
            return Err(InputError::InvalidIdentifier {
                identifier: identifier.to_string(),
                reason: e.to_string(),
            });
        }
    }

    Ok(format!("/{}/{}{}", protocol, identifier, parts.path()))
}

/// Parses and validates in one step.
pub fn resolve_input(input: &str) -> Result<String, InputError> {
    validate_input(input, &parse_input(input))
}
