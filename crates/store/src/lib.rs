//! Byte-range addressable storage for uploaded bundles.
//!
//! The bundle-manager client reads raw uploads through the [`UploadStore`]
//! trait: "give me object `key` starting at byte `offset`". Resumed
//! downloads re-open the same object at a later offset, so every
//! implementation must support reads from an arbitrary position to
//! end-of-object.

mod fs;
mod memory;

use std::future::Future;
use std::pin::Pin;

use tokio::io::AsyncRead;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Identifier of one uploaded bundle.
pub type BundleId = u64;

/// A readable byte stream positioned at the requested offset.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Errors produced by upload stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("object not found: {0}")]
    NotFound(String),
}

/// Storage backend holding raw (still compressed) bundle uploads.
pub trait UploadStore: Send + Sync {
    /// Opens a stream over object `key`, starting at byte `offset` and
    /// running to end-of-object.
    fn get<'a>(
        &'a self,
        key: &'a str,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<ByteStream, StoreError>> + Send + 'a>>;
}

/// Returns the storage key for a bundle id.
pub fn bundle_key(id: BundleId) -> String {
    format!("upload-{id}.gz")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_key_is_deterministic() {
        assert_eq!(bundle_key(42), "upload-42.gz");
        assert_eq!(bundle_key(42), bundle_key(42));
        assert_ne!(bundle_key(1), bundle_key(2));
    }
}
