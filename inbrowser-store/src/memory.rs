//! In-memory key/value table.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use inbrowser_core::constants::{CONFIG_DATABASE, CONFIG_TABLE};
use inbrowser_core::error::{GatewayError, Result};
use inbrowser_core::traits::KeyValueStore;

/// Sentinel for "puts never fail".
const NO_PUT_LIMIT: usize = usize::MAX;

/// In-memory key/value table.
///
/// Behaves like a persistent table for the lifetime of the value: reads and
/// writes need an open handle, handles nest, and contents survive closing.
///
/// # Failure injection
///
/// Tests can make the table unavailable (every `open` fails) or let a fixed
/// number of puts succeed before the rest fail, which is how partial
/// multi-field writes are exercised.
#[derive(Debug)]
pub struct MemoryStore {
    /// `<database>/<table>`
    name: String,
    /// Stored values: key → JSON value
    entries: DashMap<String, Value>,
    /// Outstanding handles
    open_handles: AtomicUsize,
    /// When set, `open` fails
    unavailable: AtomicBool,
    /// Puts that may still succeed before failures start
    puts_remaining: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty table with the configuration database and table names.
    pub fn new() -> Self {
        Self::with_name(CONFIG_DATABASE, CONFIG_TABLE)
    }

    /// Creates an empty table with explicit names.
    pub fn with_name(database: &str, table: &str) -> Self {
        Self {
            name: format!("{database}/{table}"),
            entries: DashMap::new(),
            open_handles: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            puts_remaining: AtomicUsize::new(NO_PUT_LIMIT),
        }
    }

    /// Makes every subsequent `open` fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Lets the next `n` puts succeed and fails every put after that.
    pub fn fail_puts_after(&self, n: usize) {
        self.puts_remaining.store(n, Ordering::SeqCst);
    }

    /// Removes any put failure limit.
    pub fn clear_failures(&self) {
        self.unavailable.store(false, Ordering::SeqCst);
        self.puts_remaining.store(NO_PUT_LIMIT, Ordering::SeqCst);
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// True if `key` has been written.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes a value directly, without a handle.
    ///
    /// Useful for seeding a table with data another context wrote.
    pub fn seed(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open_handles() == 0 {
            return Err(GatewayError::StoreNotOpen(self.name.clone()));
        }
        Ok(())
    }

    fn take_put_permit(&self) -> bool {
        self.puts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| match remaining {
                NO_PUT_LIMIT => Some(NO_PUT_LIMIT),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn open(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::StorageUnavailable(format!(
                "{} is unavailable",
                self.name
            )));
        }
        let handles = self.open_handles.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(store = %self.name, handles, "Opened store");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.ensure_open()?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self, value), fields(store = %self.name))]
    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.ensure_open()?;
        if !self.take_put_permit() {
            return Err(GatewayError::StorageError(format!("write of '{key}' rejected")));
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn close(&self) {
        let result = self
            .open_handles
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if result.is_err() {
            warn!(store = %self.name, "Close called without an open handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        store.open().await.unwrap();
        assert_eq!(store.get("gateways").await.unwrap(), None);
        store.close();
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        store.open().await.unwrap();
        store.put("enableWss", Value::Bool(false)).await.unwrap();
        assert_eq!(store.get("enableWss").await.unwrap(), Some(Value::Bool(false)));
        store.close();

        // contents survive closing
        store.open().await.unwrap();
        assert_eq!(store.get("enableWss").await.unwrap(), Some(Value::Bool(false)));
        store.close();
    }

    #[tokio::test]
    async fn test_requires_open_handle() {
        let store = MemoryStore::new();
        let err = store.get("debug").await.unwrap_err();
        assert!(matches!(err, GatewayError::StoreNotOpen(_)));
        assert!(store.put("debug", Value::from("")).await.is_err());
    }

    #[tokio::test]
    async fn test_nested_handles() {
        let store = MemoryStore::new();
        store.open().await.unwrap();
        store.open().await.unwrap();
        store.close();
        assert!(store.get("debug").await.is_ok());
        store.close();
        assert!(store.get("debug").await.is_err());

        // extra close is ignored
        store.close();
        assert_eq!(store.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let err = store.open().await.unwrap_err();
        assert!(err.is_storage_error());

        store.clear_failures();
        assert!(store.open().await.is_ok());
        store.close();
    }

    #[tokio::test]
    async fn test_fail_puts_after() {
        let store = MemoryStore::new();
        store.fail_puts_after(2);
        store.open().await.unwrap();

        assert!(store.put("a", Value::from(1)).await.is_ok());
        assert!(store.put("b", Value::from(2)).await.is_ok());
        assert!(store.put("c", Value::from(3)).await.is_err());
        assert_eq!(store.len(), 2);
        store.close();
    }

    #[test]
    fn test_name() {
        assert_eq!(MemoryStore::new().name(), "inbrowser-sw/config");
        assert_eq!(MemoryStore::with_name("db", "t").name(), "db/t");
    }
}
