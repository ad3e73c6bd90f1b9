//! Error types for the in-browser gateway.
//!
//! One hierarchy, built with `thiserror`, shared by every crate in the
//! workspace. Read paths recover from storage errors locally, so most
//! variants only ever reach logs; validation errors are the ones callers see.

use thiserror::Error;

/// Result type alias using `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for all gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ═══════════════════════════════════════════════════════════════════════════
    // ADDRESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Content identifier could not be decoded.
    #[error("Invalid CID '{cid}': {reason}")]
    InvalidCid {
        /// The identifier as given
        cid: String,
        /// Why decoding failed
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration record violates an invariant.
    #[error("Config is invalid. {0}")]
    InvalidConfig(String),

    /// A field name outside the known set was used.
    #[error("Unknown config key: {0}")]
    UnknownField(String),

    /// A field received a value of the wrong shape.
    #[error("Invalid value for config key '{field}': {reason}")]
    InvalidFieldValue {
        /// Wire key of the field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Text input for a field did not validate.
    #[error("{0}")]
    InvalidInput(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Underlying store could not be opened.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Operation attempted on a store with no open handle.
    #[error("Store '{0}' is not open")]
    StoreNotOpen(String),

    /// Read or write failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SYNC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The background worker is not registered or not listening.
    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// The parent window channel is closed.
    #[error("Parent window unavailable: {0}")]
    ParentUnavailable(String),

    /// Target origin missing or not usable for scoped delivery.
    #[error("Invalid target origin: {0}")]
    InvalidOrigin(String),

    /// HTTP request to a collaborator failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    // ═══════════════════════════════════════════════════════════════════════════
    // I/O ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GatewayError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GatewayError::HttpError(_)
                | GatewayError::WorkerUnavailable(_)
                | GatewayError::ParentUnavailable(_)
                | GatewayError::StorageUnavailable(_)
        )
    }

    /// Returns true if this is a storage error.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            GatewayError::StorageUnavailable(_)
                | GatewayError::StoreNotOpen(_)
                | GatewayError::StorageError(_)
                | GatewayError::IoError(_)
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidConfig(_)
                | GatewayError::UnknownField(_)
                | GatewayError::InvalidFieldValue { .. }
                | GatewayError::InvalidInput(_)
                | GatewayError::InvalidCid { .. }
        )
    }
}
