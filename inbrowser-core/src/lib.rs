//! # inbrowser core
//!
//! Core types, errors, and traits shared by the in-browser gateway crates.
//!
//! - **Types**: the parsed address triple and the configuration record
//! - **Errors**: one error hierarchy for every crate in the workspace
//! - **Constants**: built-in defaults, storage names, and wire constants
//! - **Traits**: the collaborators the core talks to (storage, worker, parent window)
//! - **Input**: conversions between the config form's text inputs and typed fields
//!
//! ## Example
//!
//! ```rust
//! use inbrowser_core::{compute_defaults, Environment};
//!
//! let defaults = compute_defaults(&Environment::from_hostname("localhost"));
//! assert!(defaults.enable_recursive_gateways);
//! assert!(!defaults.debug.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod input;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{GatewayError, Result};
pub use traits::*;
pub use types::*;
