//! Cross-context message envelope.
//!
//! ```json
//! {"source":"config-iframe","target":"PARENT","action":"RELOAD_CONFIG","config":{...}}
//! ```
//!
//! `action` and `target` are checked against closed allow-lists on decode.
//! Envelopes carrying anything else are ignored, not rejected, so newer
//! senders cannot break older receivers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::ConfigRecord;
use crate::constants::{
    ACTION_RELOAD_CONFIG, SOURCE_CONFIG_IFRAME, TARGET_PARENT, TARGET_WORKER,
};
use crate::error::{GatewayError, Result};

/// Known message actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    /// Receiver should reload its configuration.
    #[serde(rename = "RELOAD_CONFIG")]
    ReloadConfig,
}

impl SyncAction {
    /// Parses a wire action, `None` for anything outside the allow-list.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            ACTION_RELOAD_CONFIG => Some(Self::ReloadConfig),
            _ => None,
        }
    }
}

/// Known message targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncTarget {
    /// The window embedding the config page.
    #[serde(rename = "PARENT")]
    Parent,
    /// The background worker serving content.
    #[serde(rename = "SW")]
    Worker,
}

impl SyncTarget {
    /// Parses a wire target, `None` for anything outside the allow-list.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            TARGET_PARENT => Some(Self::Parent),
            TARGET_WORKER => Some(Self::Worker),
            _ => None,
        }
    }
}

/// Envelope exchanged between the config page, its parent window, and the worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// Sending context
    pub source: String,
    /// Receiving context
    pub target: SyncTarget,
    /// What the receiver should do
    pub action: SyncAction,
    /// Full record, present when propagating to a parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigRecord>,
}

#[derive(Deserialize)]
struct RawMessage {
    source: String,
    target: String,
    action: String,
    #[serde(default)]
    config: Option<Value>,
}

impl SyncMessage {
    /// Reload trigger for the background worker.
    pub fn reload_worker(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: SyncTarget::Worker,
            action: SyncAction::ReloadConfig,
            config: None,
        }
    }

    /// Full-record hand-off from an embedded config page to its parent.
    pub fn propagate_config(config: ConfigRecord) -> Self {
        Self {
            source: SOURCE_CONFIG_IFRAME.into(),
            target: SyncTarget::Parent,
            action: SyncAction::ReloadConfig,
            config: Some(config),
        }
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes an envelope.
    ///
    /// Returns `Ok(None)` for well-formed envelopes with an unknown action or
    /// target. Malformed JSON or a malformed config payload is an error.
    pub fn decode(raw: &str) -> Result<Option<Self>> {
        let message: RawMessage = serde_json::from_str(raw)?;

        let Some(action) = SyncAction::parse(&message.action) else {
            debug!(action = %message.action, source = %message.source, "Ignoring unknown action");
            return Ok(None);
        };
        let Some(target) = SyncTarget::parse(&message.target) else {
            debug!(target = %message.target, source = %message.source, "Ignoring unknown target");
            return Ok(None);
        };

        let config = message
            .config
            .map(serde_json::from_value::<ConfigRecord>)
            .transpose()?;

        Ok(Some(Self {
            source: message.source,
            target,
            action,
            config,
        }))
    }
}

/// Origin a cross-document message is scoped to.
///
/// Always a concrete `scheme://host[:port]` origin. The wildcard `*` and
/// opaque origins cannot be represented.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetOrigin(String);

impl TargetOrigin {
    /// Parses and normalizes an origin string.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(GatewayError::InvalidOrigin("origin is empty".into()));
        }
        if raw == "*" {
            return Err(GatewayError::InvalidOrigin(
                "wildcard origin is not allowed".into(),
            ));
        }

        let url = Url::parse(raw).map_err(|e| GatewayError::InvalidOrigin(format!("{raw}: {e}")))?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(GatewayError::InvalidOrigin(format!("{raw}: opaque origin")));
        }

        Ok(Self(origin.ascii_serialization()))
    }

    /// Returns the serialized origin.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagate_envelope_wire_format() {
        let message = SyncMessage::propagate_config(ConfigRecord::default());
        let json: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(json["source"], "config-iframe");
        assert_eq!(json["target"], "PARENT");
        assert_eq!(json["action"], "RELOAD_CONFIG");
        assert_eq!(json["config"]["enableWss"], true);
    }

    #[test]
    fn test_reload_envelope_has_no_config() {
        let json = SyncMessage::reload_worker("config-page").to_json().unwrap();
        assert!(!json.contains("config\":"));
        assert!(json.contains("\"target\":\"SW\""));
    }

    #[test]
    fn test_decode_known_action() {
        let raw = SyncMessage::propagate_config(ConfigRecord::default()).to_json().unwrap();
        let message = SyncMessage::decode(&raw).unwrap().unwrap();
        assert_eq!(message.target, SyncTarget::Parent);
        assert_eq!(message.config, Some(ConfigRecord::default()));
    }

    #[test]
    fn test_decode_ignores_unknown_action() {
        let raw = r#"{"source":"config-iframe","target":"PARENT","action":"DELETE_EVERYTHING"}"#;
        assert_eq!(SyncMessage::decode(raw).unwrap(), None);
    }

    #[test]
    fn test_decode_ignores_unknown_target() {
        let raw = r#"{"source":"config-iframe","target":"OPENER","action":"RELOAD_CONFIG"}"#;
        assert_eq!(SyncMessage::decode(raw).unwrap(), None);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(SyncMessage::decode("not json").is_err());
        let bad_config = r#"{"source":"x","target":"PARENT","action":"RELOAD_CONFIG","config":{"gateways":1}}"#;
        assert!(SyncMessage::decode(bad_config).is_err());
    }

    #[test]
    fn test_target_origin_normalizes() {
        let origin = TargetOrigin::parse("https://inbrowser.link/some/path?q=1").unwrap();
        assert_eq!(origin.as_str(), "https://inbrowser.link");

        let origin = TargetOrigin::parse("http://localhost:3000").unwrap();
        assert_eq!(origin.to_string(), "http://localhost:3000");
    }

    #[test]
    fn test_target_origin_rejects_wildcard_and_opaque() {
        assert!(TargetOrigin::parse("*").is_err());
        assert!(TargetOrigin::parse("").is_err());
        assert!(TargetOrigin::parse("data:text/plain,hi").is_err());
        assert!(TargetOrigin::parse("not an origin").is_err());
    }
}
