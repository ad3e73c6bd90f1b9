//! Channel to the parent window.

use async_trait::async_trait;
use tokio::sync::mpsc;

use inbrowser_core::error::{GatewayError, Result};
use inbrowser_core::traits::ParentChannel;
use inbrowser_core::types::{SyncMessage, TargetOrigin};

/// Delivers `(origin, envelope)` pairs to a parent in the same process.
///
/// The receiving side is expected to drop envelopes whose origin is not its own.
#[derive(Clone, Debug)]
pub struct LocalParentChannel {
    tx: mpsc::UnboundedSender<(TargetOrigin, SyncMessage)>,
}

impl LocalParentChannel {
    /// Creates a channel and the receiver the parent listens on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(TargetOrigin, SyncMessage)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ParentChannel for LocalParentChannel {
    async fn post_message(&self, message: SyncMessage, target_origin: &TargetOrigin) -> Result<()> {
        self.tx
            .send((target_origin.clone(), message))
            .map_err(|_| GatewayError::ParentUnavailable("parent window is gone".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbrowser_core::types::ConfigRecord;

    #[tokio::test]
    async fn test_delivers_with_origin() {
        let (channel, mut rx) = LocalParentChannel::new();
        let origin = TargetOrigin::parse("https://inbrowser.link").unwrap();

        channel
            .post_message(SyncMessage::propagate_config(ConfigRecord::default()), &origin)
            .await
            .unwrap();

        let (delivered_to, message) = rx.recv().await.unwrap();
        assert_eq!(delivered_to, origin);
        assert_eq!(message.config, Some(ConfigRecord::default()));
    }

    #[tokio::test]
    async fn test_closed_parent() {
        let (channel, rx) = LocalParentChannel::new();
        drop(rx);

        let origin = TargetOrigin::parse("https://inbrowser.link").unwrap();
        let err = channel
            .post_message(SyncMessage::propagate_config(ConfigRecord::default()), &origin)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ParentUnavailable(_)));
    }
}
