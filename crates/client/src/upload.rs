//! Chunked bundle upload.
//!
//! The bundle manager caps request bodies, so an artifact is sliced at the
//! configured raw-byte bound and each slice is compressed independently.
//! Every chunk is then a self-contained gzip stream the server can
//! decompress-and-append on arrival without buffering across chunk
//! boundaries. The stitch call makes the assembled artifact valid; until
//! it succeeds, nothing server-side is.

use std::path::Path;

use bundleferry_store::BundleId;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::BundleClient;
use crate::compress::gzip_compress;
use crate::error::TransferError;

/// Per-chunk acknowledgment body from the endpoint.
#[derive(Debug, Deserialize)]
struct ChunkAck {
    size: u64,
}

impl BundleClient {
    /// Uploads the artifact at `path` as bundle `id`.
    ///
    /// Chunks are posted strictly in index order starting at 0, one at a
    /// time; the stitch call follows unconditionally, also for artifacts
    /// that fit in a single chunk. Any non-2xx response aborts the whole
    /// operation immediately.
    pub async fn send_db(
        &self,
        cancel: &CancellationToken,
        id: BundleId,
        path: &Path,
    ) -> Result<(), TransferError> {
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            result = tokio::fs::read(path) => result?,
        };

        for (index, slice) in raw.chunks(self.max_payload_size).enumerate() {
            let compressed = gzip_compress(slice)?;
            let route = format!("/dbs/{id}/{index}");

            let resp = self.post(cancel, &route, compressed).await?;
            let bytes = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                result = resp.bytes() => result?,
            };
            let ack: ChunkAck = serde_json::from_slice(&bytes)?;
            debug!(
                id,
                index,
                raw_size = slice.len(),
                acked = ack.size,
                "bundle chunk sent"
            );
        }

        let route = format!("/dbs/{id}/stitch");
        self.post(cancel, &route, Vec::new()).await?;

        let chunks = raw.len().div_ceil(self.max_payload_size);
        info!(id, chunks, raw_bytes = raw.len(), "bundle upload complete");
        if let Some(observer) = &self.observer {
            observer.upload_finished(id, chunks, raw.len() as u64);
        }
        Ok(())
    }
}
