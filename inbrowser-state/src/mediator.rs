//! Config state mediator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use inbrowser_core::error::Result;
use inbrowser_core::types::{ConfigField, ConfigRecord, ConfigUpdate};
use inbrowser_store::ConfigStore;

/// In-memory working copy of the configuration record.
///
/// Starts out holding the store's defaults and publishes every change on a
/// watch channel, so views can re-render from [`ConfigMediator::subscribe`].
/// Mutations are never written back on their own; callers decide when to
/// [`save`](ConfigMediator::save).
pub struct ConfigMediator {
    store: Arc<ConfigStore>,
    state: watch::Sender<ConfigRecord>,
    loaded: AtomicBool,
    /// Set by mutations, cleared when a load replaces the working copy
    edited: AtomicBool,
}

impl ConfigMediator {
    /// Creates a mediator publishing the store's defaults.
    pub fn new(store: Arc<ConfigStore>) -> Self {
        let (state, _) = watch::channel(store.defaults().clone());
        Self {
            store,
            state,
            loaded: AtomicBool::new(false),
            edited: AtomicBool::new(false),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Snapshot of the current record.
    pub fn current(&self) -> ConfigRecord {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published record.
    pub fn subscribe(&self) -> watch::Receiver<ConfigRecord> {
        self.state.subscribe()
    }

    /// True once a load from the store has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Replaces the working copy with the persisted record and publishes it.
    #[instrument(skip(self))]
    pub async fn load(&self) -> ConfigRecord {
        let config = self.store.get_config().await;
        self.state.send_modify(|current| {
            *current = config.clone();
            self.edited.store(false, Ordering::SeqCst);
        });
        self.loaded.store(true, Ordering::SeqCst);
        debug!("Published persisted config");
        config
    }

    /// Starts the initial load in the background.
    ///
    /// Consumers see the defaults until it completes. If the working copy is
    /// edited before then, the edits are kept and the loaded record is not
    /// published.
    pub fn spawn_initial_load(self: &Arc<Self>) -> JoinHandle<()> {
        let mediator = Arc::clone(self);
        tokio::spawn(async move {
            mediator.initial_load().await;
        })
    }

    #[instrument(skip(self))]
    async fn initial_load(&self) {
        let config = self.store.get_config().await;
        let published = self.state.send_if_modified(|current| {
            if self.edited.load(Ordering::SeqCst) {
                return false;
            }
            *current = config;
            true
        });
        self.loaded.store(true, Ordering::SeqCst);

        if published {
            debug!("Published persisted config");
        } else {
            debug!("Working copy edited during initial load, keeping edits");
        }
    }

    /// Sets one field by its wire key.
    ///
    /// Unknown keys and values of the wrong shape are rejected and leave the
    /// working copy untouched.
    pub fn set_field(&self, key: &str, value: Value) -> Result<()> {
        let field: ConfigField = key.parse()?;
        self.apply(ConfigUpdate::from_value(field, value)?);
        Ok(())
    }

    /// Sets one field from its text form.
    pub fn set_input(&self, field: ConfigField, text: &str) -> Result<()> {
        self.apply(ConfigUpdate::from_input(field, text)?);
        Ok(())
    }

    /// Applies a typed mutation to the working copy.
    pub fn apply(&self, update: ConfigUpdate) {
        debug!(field = %update.field(), "Updating working copy");
        self.state.send_modify(|config| {
            config.apply(update);
            self.edited.store(true, Ordering::SeqCst);
        });
    }

    /// Resets the persisted record, then reloads it.
    #[instrument(skip(self))]
    pub async fn reset_to_defaults(&self) -> ConfigRecord {
        self.store.reset_config().await;
        self.load().await
    }

    /// Persists the working copy and returns what was saved.
    ///
    /// Empty collections are saved as their defaults, and the working copy is
    /// updated to match. Fails only when the record does not validate; storage
    /// failures are logged by the store.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<ConfigRecord> {
        let config = self.store.normalize(&self.current());
        self.store.set_config(&config).await?;

        self.state.send_if_modified(|current| {
            if *current == config {
                return false;
            }
            *current = config.clone();
            true
        });
        info!("Working copy saved");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbrowser_core::error::GatewayError;
    use inbrowser_store::MemoryStore;
    use serde_json::json;

    fn setup() -> (Arc<MemoryStore>, Arc<ConfigMediator>) {
        let backend = Arc::new(MemoryStore::new());
        let store = Arc::new(ConfigStore::new(backend.clone(), ConfigRecord::default()));
        (backend, Arc::new(ConfigMediator::new(store)))
    }

    #[tokio::test]
    async fn test_starts_with_defaults() {
        let (backend, mediator) = setup();
        backend.seed("debug", json!("inbrowser*"));

        assert!(!mediator.is_loaded());
        assert_eq!(mediator.current(), ConfigRecord::default());

        mediator.load().await;
        assert!(mediator.is_loaded());
        assert_eq!(mediator.current().debug, "inbrowser*");
    }

    #[tokio::test]
    async fn test_initial_load_publishes() {
        let (backend, mediator) = setup();
        backend.seed("enableWebTransport", json!(true));
        let mut rx = mediator.subscribe();

        mediator.spawn_initial_load().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().enable_web_transport);
    }

    #[tokio::test]
    async fn test_initial_load_keeps_earlier_edits() {
        let (backend, mediator) = setup();
        backend.seed("enableWebTransport", json!(true));
        backend.seed("debug", json!("stored"));

        mediator.set_field("debug", json!("edited")).unwrap();
        mediator.spawn_initial_load().await.unwrap();

        let current = mediator.current();
        assert!(mediator.is_loaded());
        assert_eq!(current.debug, "edited");
        assert!(!current.enable_web_transport);

        // an explicit load still replaces the working copy
        mediator.load().await;
        assert_eq!(mediator.current().debug, "stored");
    }

    #[tokio::test]
    async fn test_set_field_is_not_persisted() {
        let (backend, mediator) = setup();

        mediator.set_field("enableWss", json!(false)).unwrap();
        assert!(!mediator.current().enable_wss);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_set_field_rejects_unknown_key() {
        let (_, mediator) = setup();
        let before = mediator.current();

        let err = mediator.set_field("enableWSS", json!(false)).unwrap_err();
        assert!(matches!(err, GatewayError::UnknownField(_)));

        let err = mediator.set_field("gateways", json!("https://a.example")).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidFieldValue { .. }));
        assert_eq!(mediator.current(), before);
    }

    #[tokio::test]
    async fn test_set_input() {
        let (_, mediator) = setup();
        mediator
            .set_input(ConfigField::Gateways, "https://a.example\nhttps://b.example")
            .unwrap();
        assert_eq!(mediator.current().gateways, vec!["https://a.example", "https://b.example"]);

        assert!(mediator.set_input(ConfigField::Routers, "").is_err());
    }

    #[tokio::test]
    async fn test_edits_batch_until_save() {
        let (backend, mediator) = setup();
        mediator.apply(ConfigUpdate::EnableWebTransport(true));
        mediator.apply(ConfigUpdate::Debug("inbrowser*".into()));
        assert!(backend.is_empty());

        let saved = mediator.save().await.unwrap();
        assert!(saved.enable_web_transport);
        assert_eq!(mediator.store().get_config().await, saved);
    }

    #[tokio::test]
    async fn test_save_fills_empty_collections() {
        let (_, mediator) = setup();
        mediator.set_field("gateways", json!([])).unwrap();
        mediator.set_field("dnsJsonResolvers", json!({})).unwrap();
        let mut rx = mediator.subscribe();
        rx.borrow_and_update();

        let saved = mediator.save().await.unwrap();
        let defaults = ConfigRecord::default();

        assert_eq!(saved.gateways, defaults.gateways);
        assert_eq!(saved.dns_json_resolvers, defaults.dns_json_resolvers);
        assert_eq!(mediator.current(), saved);
        assert!(rx.has_changed().unwrap());
        assert_eq!(mediator.store().get_config().await, saved);
    }

    #[tokio::test]
    async fn test_invalid_save_surfaces_error() {
        let (backend, mediator) = setup();
        for field in ["enableRecursiveGateways", "enableGatewayProviders", "enableWss", "enableWebTransport"] {
            mediator.set_field(field, json!(false)).unwrap();
        }

        let err = mediator.save().await.unwrap_err();
        assert!(err.is_validation_error());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_reset_to_defaults() {
        let (_, mediator) = setup();
        mediator.apply(ConfigUpdate::Routers(vec!["https://r.example".into()]));
        mediator.save().await.unwrap();

        mediator.apply(ConfigUpdate::Debug("unsaved".into()));
        let config = mediator.reset_to_defaults().await;

        assert_eq!(config, ConfigRecord::default());
        assert_eq!(mediator.current(), ConfigRecord::default());
    }
}
