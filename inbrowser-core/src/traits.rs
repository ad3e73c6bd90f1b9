//! Collaborator traits.
//!
//! The core never owns storage or messaging transports. It talks to them
//! through these interfaces, which keeps every flow testable in-process.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{SyncMessage, TargetOrigin};

// ═══════════════════════════════════════════════════════════════════════════════
// KEY/VALUE STORAGE
// ═══════════════════════════════════════════════════════════════════════════════

/// Origin-scoped persistent key/value table.
///
/// Handles are explicit: callers `open()` before reading or writing and
/// `close()` afterwards on every exit path. Opens may nest; the handle is
/// released when the last opener closes.
///
/// Implementations might use:
/// - In-memory maps (for testing/development)
/// - A JSON document on disk (for the CLI)
/// - Browser IndexedDB (behind a wasm binding)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Identifies the table, as `<database>/<table>`.
    fn name(&self) -> String;

    /// Acquires a handle.
    async fn open(&self) -> Result<()>;

    /// Reads a key. `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Durably writes one key.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Releases a handle. Never fails.
    fn close(&self);
}

// ═══════════════════════════════════════════════════════════════════════════════
// MESSAGING
// ═══════════════════════════════════════════════════════════════════════════════

/// Channel to the background worker. The core only ever sends on it.
#[async_trait]
pub trait WorkerChannel: Send + Sync {
    /// Delivers a message to the worker.
    ///
    /// Fire-and-forget channels return once the message is queued;
    /// request/response channels return once the worker answered.
    async fn send(&self, message: SyncMessage) -> Result<()>;
}

/// Cross-document channel to the parent window.
#[async_trait]
pub trait ParentChannel: Send + Sync {
    /// Posts a message that only a document at `target_origin` may receive.
    async fn post_message(&self, message: SyncMessage, target_origin: &TargetOrigin) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOGGING
// ═══════════════════════════════════════════════════════════════════════════════

/// Applies the configuration's `debug` filter to the running logger.
pub trait DebugFilterHook: Send + Sync {
    /// Replaces the active debug filter. Invalid filters are the hook's
    /// problem to report; this never fails the caller.
    fn apply(&self, filter: &str);
}
