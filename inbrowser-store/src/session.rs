//! Scoped store handles.

use serde_json::Value;

use inbrowser_core::error::Result;
use inbrowser_core::traits::KeyValueStore;

/// An open handle on a [`KeyValueStore`], released when dropped.
///
/// Every read/write sequence goes through a session so the handle is closed
/// on every exit path, including early returns through `?`.
pub struct StoreSession<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> StoreSession<'a> {
    /// Opens the store and returns a session holding the handle.
    pub async fn open(store: &'a dyn KeyValueStore) -> Result<StoreSession<'a>> {
        store.open().await?;
        Ok(Self { store })
    }

    /// Reads a key.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.store.get(key).await
    }

    /// Writes a key.
    pub async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.store.put(key, value).await
    }
}

impl Drop for StoreSession<'_> {
    fn drop(&mut self) {
        self.store.close();
    }
}
