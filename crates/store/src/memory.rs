//! In-memory upload store for tests and local development.

use std::collections::HashMap;
use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::RwLock;

use crate::{ByteStream, StoreError, UploadStore};

/// Upload store keeping every object in a map (thread-safe).
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an object.
    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>) {
        let mut objects = self.objects.write().unwrap();
        objects.insert(key.into(), bytes);
    }
}

impl UploadStore for MemoryStore {
    fn get<'a>(
        &'a self,
        key: &'a str,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<ByteStream, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let objects = self.objects.read().unwrap();
            let bytes = objects
                .get(key)
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

            // Offset past the end serves an empty stream, matching a
            // filesystem read at end-of-file.
            let start = (offset as usize).min(bytes.len());
            Ok(Box::new(Cursor::new(bytes[start..].to_vec())) as ByteStream)
        })
    }
}
