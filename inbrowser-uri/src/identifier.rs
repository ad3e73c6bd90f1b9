//! Content identifier decoding.

use cid::Cid;

use inbrowser_core::error::{GatewayError, Result};

/// Decodes a CID in any of its text encodings (base58 v0, multibase v1).
pub fn decode_cid(raw: &str) -> Result<Cid> {
    Cid::try_from(raw).map_err(|e| GatewayError::InvalidCid {
        cid: raw.to_string(),
        reason: e.to_string(),
    })
}

/// True if `raw` decodes as a CID.
pub fn is_valid_cid(raw: &str) -> bool {
    decode_cid(raw).is_ok()
}
