//! # inbrowser URI
//!
//! Turns whatever a user typed (a gateway URL, a native `ipfs://` URI, or a
//! bare CID) into a normalized [`IpfsUriParts`] triple, and decides whether
//! that triple is navigable.
//!
//! Parsing and validation are separate: [`parse_input`] never
//! fails and returns whatever it could extract, [`validate_input`] turns that
//! into either a gateway-internal path or a message for the user.
//!
//! ## Example
//!
//! ```rust
//! use inbrowser_uri::{parse_input, validate_input};
//!
//! let input = "https://ipfs.io/ipfs/bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi/wiki/";
//! let parts = parse_input(input);
//! assert_eq!(parts.path(), "/wiki/");
//!
//! let path = validate_input(input, &parts).unwrap();
//! assert_eq!(path, "/ipfs/bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi/wiki/");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod identifier;
mod parser;
mod validate;

pub use identifier::{decode_cid, is_valid_cid};
pub use parser::parse_input;
pub use validate::{resolve_input, validate_input, InputError, FORMAT_HELP};

pub use inbrowser_core::types::{IpfsUriParts, Protocol};
