//! Error types for bundle transfer operations.

use bundleferry_store::{BundleId, StoreError};

/// Errors produced by the bundle-manager client.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {route}")]
    Endpoint { route: String, status: u16 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A download attempt failed without transferring a single byte.
    /// Returned instead of retrying so a persistently failing source
    /// cannot spin the resume loop forever.
    #[error("no download progress")]
    NoProgress,

    #[error("cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("exists response missing id {0}")]
    MissingId(BundleId),
}
