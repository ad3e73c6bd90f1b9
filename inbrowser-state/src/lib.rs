//! Observable configuration state.
//!
//! Holds the config page's working copy of the record. Edits stay in memory
//! until [`ConfigMediator::save`] writes them through the persisted store.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod mediator;

pub use mediator::ConfigMediator;
