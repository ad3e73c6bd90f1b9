//! # inbrowser sync
//!
//! Save flow and cross-context propagation for the config page.
//!
//! After a durable save the page tells the background worker to reload, and
//! when it is embedded in another window, hands the full record to that
//! window, scoped to the origin the parent passed in the URL fragment:
//!
//! ```text
//! https://inbrowser.link/#/ipfs-sw-config@origin=https%3A%2F%2Fbafy...ipfs.inbrowser.link
//! ```
//!
//! Channels:
//!
//! - **Worker**: in-process queue ([`LocalWorkerChannel`]) or HTTP control endpoint ([`HttpWorkerChannel`])
//! - **Parent**: in-process queue ([`LocalParentChannel`])
//!
//! ## Example
//!
//! ```rust,ignore
//! let (worker, mut worker_rx) = LocalWorkerChannel::new();
//! let session = ConfigSession::new(mediator, Arc::new(worker), PageContext::top_level(url));
//!
//! session.mount().await;
//! session.mediator().set_field("enableWss", json!(false))?;
//! let outcome = session.save().await?;
//! assert!(outcome.navigate_back);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod origin;
mod parent;
mod session;
mod worker;

pub use origin::{origin_from_fragment, parent_origin};
pub use parent::LocalParentChannel;
pub use session::{ConfigSession, PageContext, SaveOutcome};
pub use worker::{HttpWorkerChannel, LocalWorkerChannel};

// Re-export the channel traits from core
pub use inbrowser_core::traits::{ParentChannel, WorkerChannel};
