//! Domain types for the in-browser gateway.
//!
//! - [`IpfsUriParts`]: the normalized `{protocol, identifier, path}` address triple
//! - [`ConfigRecord`]: the retrieval settings shared by every execution context
//! - [`ConfigField`] / [`ConfigUpdate`]: the closed set of fields and their typed mutations
//! - [`Environment`]: what default computation is allowed to know about the host
//! - [`SyncMessage`] / [`TargetOrigin`]: the cross-context envelope and where it may go

mod address;
mod config;
mod message;

pub use address::*;
pub use config::*;
pub use message::*;
