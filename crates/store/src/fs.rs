//! Filesystem-backed upload store.
//!
//! Workers that mount the bundle volume directly read uploads from disk
//! instead of going through the bundle manager's HTTP surface.

use std::future::Future;
use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;

use tokio::io::AsyncSeekExt;

use crate::{ByteStream, StoreError, UploadStore};

/// Upload store rooted at a directory; one file per key.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl UploadStore for FsStore {
    fn get<'a>(
        &'a self,
        key: &'a str,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<ByteStream, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            validate_key(key)?;

            let path = self.root.join(key);
            let mut file = match tokio::fs::File::open(&path).await {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StoreError::NotFound(key.to_string()));
                }
                Err(e) => return Err(e.into()),
            };

            if offset > 0 {
                file.seek(SeekFrom::Start(offset)).await?;
            }

            Ok(Box::new(file) as ByteStream)
        })
    }
}

/// Validates that a storage key stays inside the store root.
///
/// Rejects empty keys, absolute paths, parent directory traversal and
/// Windows prefix components.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("empty key".into()));
    }

    let path = Path::new(key);

    if path.is_absolute() {
        return Err(StoreError::InvalidKey(format!(
            "absolute key not allowed: {key}"
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(StoreError::InvalidKey(format!(
                    "parent directory traversal not allowed: {key}"
                )));
            }
            Component::Prefix(_) => {
                return Err(StoreError::InvalidKey(format!(
                    "path prefix not allowed: {key}"
                )));
            }
            Component::RootDir => {
                return Err(StoreError::InvalidKey(format!(
                    "absolute key not allowed: {key}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}
