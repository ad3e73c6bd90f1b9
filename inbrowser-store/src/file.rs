//! File-based key/value table.
//!
//! Stores each table as one JSON document on disk. Every put rewrites the
//! document atomically, so a crash never leaves a half-written table.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use inbrowser_core::constants::{CONFIG_DATABASE, CONFIG_TABLE};
use inbrowser_core::error::{GatewayError, Result};
use inbrowser_core::traits::KeyValueStore;

/// File-based key/value table.
///
/// # Layout
///
/// ```text
/// <root>/<database>/<table>.json     {"gateways": [...], "enableWss": true, ...}
/// ```
///
/// The document is loaded by the first `open` and cached until the last
/// handle closes, so a later `open` picks up changes made by other processes.
pub struct FileStore {
    /// `<database>/<table>`
    name: String,
    /// Path to the table document
    path: PathBuf,
    /// Cached document, present while a handle is open
    entries: RwLock<Option<Map<String, Value>>>,
    /// Outstanding handles
    open_handles: AtomicUsize,
    /// Serializes document rewrites
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a table under `root`. Nothing touches the disk until `open`.
    pub fn new(root: impl AsRef<Path>, database: &str, table: &str) -> Self {
        let path = root
            .as_ref()
            .join(database)
            .join(format!("{table}.json"));

        Self {
            name: format!("{database}/{table}"),
            path,
            entries: RwLock::new(None),
            open_handles: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates the configuration table under `root`.
    pub fn for_config(root: impl AsRef<Path>) -> Self {
        Self::new(root, CONFIG_DATABASE, CONFIG_TABLE)
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Reads the document from disk. A missing file is an empty table.
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<Map<String, Value>> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No table document yet");
                return Ok(Map::new());
            }
            Err(e) => {
                return Err(GatewayError::StorageUnavailable(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let document: Value = serde_json::from_slice(&contents).map_err(|e| {
            GatewayError::StorageError(format!("Corrupt table document {}: {}", self.path.display(), e))
        })?;

        match document {
            Value::Object(entries) => {
                info!(keys = entries.len(), "Loaded table document");
                Ok(entries)
            }
            _ => Err(GatewayError::StorageError(format!(
                "Table document {} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Writes the document atomically (write to temp, then rename).
    async fn save(&self, contents: Vec<u8>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn open(&self) -> Result<()> {
        // The handle count only changes under the `entries` write lock, so a
        // concurrent last close cannot drop the cache under a new handle.
        {
            let entries = self.entries.write();
            if entries.is_some() {
                let handles = self.open_handles.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(store = %self.name, handles, "Opened store");
                return Ok(());
            }
        }

        let loaded = self.load().await?;
        let mut entries = self.entries.write();
        if entries.is_none() {
            *entries = Some(loaded);
        }
        let handles = self.open_handles.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(store = %self.name, handles, "Opened store");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.entries.read().as_ref() {
            Some(entries) if self.open_handles() > 0 => Ok(entries.get(key).cloned()),
            _ => Err(GatewayError::StoreNotOpen(self.name.clone())),
        }
    }

    #[instrument(skip(self, value), fields(store = %self.name))]
    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let contents = {
            let mut entries = self.entries.write();
            let entries = match entries.as_mut() {
                Some(entries) if self.open_handles() > 0 => entries,
                _ => return Err(GatewayError::StoreNotOpen(self.name.clone())),
            };
            entries.insert(key.to_string(), value);
            serde_json::to_vec_pretty(&*entries)?
        };

        self.save(contents).await.map_err(|e| {
            GatewayError::StorageError(format!("Failed to write '{key}' to {}: {e}", self.path.display()))
        })
    }

    fn close(&self) {
        let mut entries = self.entries.write();
        match self
            .open_handles
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(1) => {
                *entries = None;
                debug!(store = %self.name, "Released last handle");
            }
            Ok(_) => {}
            Err(_) => warn!(store = %self.name, "Close called without an open handle"),
        }
    }
}
