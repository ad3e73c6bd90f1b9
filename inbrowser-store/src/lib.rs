//! # inbrowser store
//!
//! Durable storage for the gateway configuration record.
//!
//! This crate provides two key/value backends and the config store on top:
//!
//! - **Memory**: in-process tables for development and testing, with failure injection
//! - **File**: one JSON document per table, written atomically on every put
//! - **Config store**: reads, writes, and resets the record field by field
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use inbrowser_store::{ConfigStore, MemoryStore};
//!
//! let store = ConfigStore::new(Arc::new(MemoryStore::new()), ConfigRecord::default());
//!
//! let mut config = store.get_config().await;
//! config.enable_web_transport = true;
//! store.set_config(&config).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod file;
mod memory;
mod session;

pub use config::ConfigStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::StoreSession;

// Re-export the trait from core
pub use inbrowser_core::traits::KeyValueStore;
