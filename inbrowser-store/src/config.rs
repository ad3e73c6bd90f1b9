//! Persisted configuration store.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use inbrowser_core::error::Result;
use inbrowser_core::traits::{DebugFilterHook, KeyValueStore};
use inbrowser_core::types::{ConfigField, ConfigRecord, ConfigUpdate};

use crate::session::StoreSession;

/// Reads and writes the configuration record field by field.
///
/// Reads never fail: anything missing, empty, or unreadable comes back as
/// the defaults the store was built with. Writes are not transactional; a
/// failure part way through leaves earlier fields written.
pub struct ConfigStore {
    store: Arc<dyn KeyValueStore>,
    defaults: ConfigRecord,
    debug_hook: Option<Arc<dyn DebugFilterHook>>,
}

impl ConfigStore {
    /// Creates a config store over a key/value backend.
    pub fn new(store: Arc<dyn KeyValueStore>, defaults: ConfigRecord) -> Self {
        Self {
            store,
            defaults,
            debug_hook: None,
        }
    }

    /// Applies the record's `debug` filter through `hook` on every load and save.
    pub fn with_debug_hook(mut self, hook: Arc<dyn DebugFilterHook>) -> Self {
        self.debug_hook = Some(hook);
        self
    }

    /// Returns the defaults missing fields fall back to.
    pub fn defaults(&self) -> &ConfigRecord {
        &self.defaults
    }

    /// Returns the backend.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Returns `config` with empty gateway, router, and resolver collections
    /// replaced by the defaults. This is the record `set_config` writes.
    pub fn normalize(&self, config: &ConfigRecord) -> ConfigRecord {
        let mut config = config.clone();
        config.fill_empty_collections(&self.defaults);
        config
    }

    /// Loads the persisted record.
    ///
    /// Missing or malformed fields take their default. Empty gateway, router,
    /// and resolver collections also take their default. If the backend
    /// cannot be read at all, the whole record is the defaults.
    #[instrument(skip(self), fields(store = %self.store.name()))]
    pub async fn get_config(&self) -> ConfigRecord {
        let config = match self.read_config().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to read config, using defaults");
                self.defaults.clone()
            }
        };

        self.apply_debug_filter(&config.debug);
        config
    }

    /// Overwrites every field with its default. Failures are logged.
    #[instrument(skip(self), fields(store = %self.store.name()))]
    pub async fn reset_config(&self) {
        match self.write_config(&self.defaults).await {
            Ok(()) => info!("Config reset to defaults"),
            Err(e) => error!(error = %e, "Failed to reset config"),
        }
    }

    /// Persists a record.
    ///
    /// An invalid record is rejected before anything is written. Empty
    /// collections are written as their defaults. Storage failures after
    /// validation are logged and do not fail the call; fields written before
    /// the failure stay written.
    #[instrument(skip(self, config), fields(store = %self.store.name()))]
    pub async fn set_config(&self, config: &ConfigRecord) -> Result<()> {
        self.apply_debug_filter(&config.debug);
        config.validate()?;

        match self.write_config(&self.normalize(config)).await {
            Ok(()) => info!("Config saved"),
            Err(e) => error!(error = %e, "Failed to save config"),
        }
        Ok(())
    }

    async fn read_config(&self) -> Result<ConfigRecord> {
        let session = StoreSession::open(self.store.as_ref()).await?;
        let mut config = self.defaults.clone();

        for field in ConfigField::ALL {
            let Some(value) = session.get(field.key()).await? else {
                continue;
            };

            match ConfigUpdate::from_value(field, value) {
                Ok(update) if is_empty_collection(&update) => {
                    debug!(%field, "Stored collection is empty, using default");
                }
                Ok(update) => config.apply(update),
                Err(e) => warn!(%field, error = %e, "Ignoring malformed stored value"),
            }
        }

        Ok(config)
    }

    async fn write_config(&self, config: &ConfigRecord) -> Result<()> {
        let session = StoreSession::open(self.store.as_ref()).await?;
        for field in ConfigField::ALL {
            session.put(field.key(), config.field_value(field)).await?;
        }
        Ok(())
    }

    fn apply_debug_filter(&self, filter: &str) {
        if let Some(hook) = &self.debug_hook {
            hook.apply(filter);
        }
    }
}

fn is_empty_collection(update: &ConfigUpdate) -> bool {
    match update {
        ConfigUpdate::Gateways(urls) | ConfigUpdate::Routers(urls) => urls.is_empty(),
        ConfigUpdate::DnsJsonResolvers(resolvers) => resolvers.is_empty(),
        _ => false,
    }
}
