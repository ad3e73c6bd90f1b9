//! Config page save flow.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use inbrowser_core::constants::{SOURCE_CONFIG_IFRAME, SOURCE_CONFIG_PAGE};
use inbrowser_core::error::{GatewayError, Result};
use inbrowser_core::traits::{ParentChannel, WorkerChannel};
use inbrowser_core::types::{ConfigRecord, SyncMessage, TargetOrigin};
use inbrowser_state::ConfigMediator;

use crate::origin::parent_origin;

/// Where the config page is running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageContext {
    /// Full URL of the config page, fragment included
    pub location: String,
    /// True when the page is embedded in another window
    pub embedded: bool,
}

impl PageContext {
    /// A page loaded as the top-level document.
    pub fn top_level(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            embedded: false,
        }
    }

    /// A page embedded in a parent window.
    pub fn embedded(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            embedded: true,
        }
    }

    /// Origin the parent asked to be notified on.
    pub fn parent_origin(&self) -> Result<TargetOrigin> {
        parent_origin(&self.location)
    }

    fn source(&self) -> &'static str {
        if self.embedded {
            SOURCE_CONFIG_IFRAME
        } else {
            SOURCE_CONFIG_PAGE
        }
    }
}

/// What happened after a successful save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The record that was persisted
    pub config: ConfigRecord,
    /// The worker accepted the reload trigger
    pub worker_notified: bool,
    /// The parent window was handed the record
    pub parent_notified: bool,
    /// A top-level page should return to where the user came from
    pub navigate_back: bool,
}

/// Drives one config page: load on mount, save, reset.
///
/// Within a save the durable write always happens first. Notifying the
/// worker and the parent is best effort; their failures are logged and
/// reported in [`SaveOutcome`], never returned as errors.
pub struct ConfigSession {
    mediator: Arc<ConfigMediator>,
    worker: Arc<dyn WorkerChannel>,
    parent: Option<Arc<dyn ParentChannel>>,
    page: PageContext,
}

impl ConfigSession {
    /// Creates a session for a page.
    pub fn new(mediator: Arc<ConfigMediator>, worker: Arc<dyn WorkerChannel>, page: PageContext) -> Self {
        Self {
            mediator,
            worker,
            parent: None,
            page,
        }
    }

    /// Attaches the channel to the embedding window.
    pub fn with_parent(mut self, parent: Arc<dyn ParentChannel>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Returns the mediator holding the working copy.
    pub fn mediator(&self) -> &Arc<ConfigMediator> {
        &self.mediator
    }

    /// Returns the page context.
    pub fn page(&self) -> &PageContext {
        &self.page
    }

    /// Loads the persisted record and, when embedded, hands it to the parent.
    ///
    /// Returns whether the parent was notified.
    #[instrument(skip(self), fields(embedded = self.page.embedded))]
    pub async fn mount(&self) -> bool {
        let config = self.mediator.load().await;
        if !self.page.embedded {
            return false;
        }
        self.notify_parent(config).await
    }

    /// Saves the working copy, then tells the worker and the parent.
    ///
    /// Fails only if the record does not validate, in which case nobody is
    /// notified.
    #[instrument(skip(self), fields(embedded = self.page.embedded))]
    pub async fn save(&self) -> Result<SaveOutcome> {
        let config = self.mediator.save().await?;

        let worker_notified = self.notify_worker().await;
        let parent_notified = if self.page.embedded {
            self.notify_parent(config.clone()).await
        } else {
            false
        };

        info!(worker_notified, parent_notified, "Config saved and propagated");
        Ok(SaveOutcome {
            config,
            worker_notified,
            parent_notified,
            navigate_back: !self.page.embedded,
        })
    }

    /// Resets the persisted record to defaults and reloads the working copy.
    pub async fn reset(&self) -> ConfigRecord {
        self.mediator.reset_to_defaults().await
    }

    async fn notify_worker(&self) -> bool {
        match self.worker.send(SyncMessage::reload_worker(self.page.source())).await {
            Ok(()) => {
                debug!("Worker told to reload config");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to notify worker");
                false
            }
        }
    }

    async fn notify_parent(&self, config: ConfigRecord) -> bool {
        match self.post_to_parent(config).await {
            Ok(origin) => {
                debug!(%origin, "Config posted to parent");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to notify parent window");
                false
            }
        }
    }

    async fn post_to_parent(&self, config: ConfigRecord) -> Result<TargetOrigin> {
        let parent = self
            .parent
            .as_ref()
            .ok_or_else(|| GatewayError::ParentUnavailable("no parent channel attached".into()))?;
        let origin = self.page.parent_origin()?;

        parent
            .post_message(SyncMessage::propagate_config(config), &origin)
            .await?;
        Ok(origin)
    }
}
