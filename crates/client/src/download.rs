//! Resumable bundle download.
//!
//! A download pulls the raw (compressed) upload from the byte-range store
//! into an accumulation buffer. When an attempt dies mid-stream after
//! making progress, the next attempt re-opens the source at the exact byte
//! offset reached, so the reconstructed payload has no gaps and no
//! duplicated bytes. An attempt that dies without moving a single byte
//! aborts the download instead of retrying.

use std::io::{Cursor, Read};

use bundleferry_store::{BundleId, bundle_key};
use flate2::read::GzDecoder;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::BundleClient;
use crate::copy::CopyReport;
use crate::error::TransferError;

/// Reader over a downloaded bundle, decompressing as the caller reads.
///
/// Malformed gzip data therefore surfaces on the first read, not when the
/// download call returns.
pub struct BundleReader {
    decoder: GzDecoder<Cursor<Vec<u8>>>,
}

impl BundleReader {
    fn new(compressed: Vec<u8>) -> Self {
        Self {
            decoder: GzDecoder::new(Cursor::new(compressed)),
        }
    }
}

impl Read for BundleReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.decoder.read(buf)
    }
}

/// Outcome of one download attempt.
enum Attempt {
    /// Source exhausted cleanly; the payload is complete.
    Complete,
    /// Transient fault after some progress; resume at the advanced offset.
    Resumed { copied: u64 },
    /// Fault with zero progress; retrying would loop forever.
    Stalled(std::io::Error),
}

fn classify(report: CopyReport) -> Attempt {
    match report {
        CopyReport { error: None, .. } => Attempt::Complete,
        CopyReport {
            copied,
            error: Some(_),
        } if copied > 0 => Attempt::Resumed { copied },
        CopyReport {
            error: Some(cause), ..
        } => Attempt::Stalled(cause),
    }
}

impl BundleClient {
    /// Downloads the upload for `id` and returns a reader yielding the
    /// decompressed artifact bytes.
    pub async fn get_upload(
        &self,
        cancel: &CancellationToken,
        id: BundleId,
    ) -> Result<BundleReader, TransferError> {
        let key = bundle_key(id);
        let mut offset: u64 = 0;
        let mut payload = Vec::new();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let mut stream = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                result = self.store.get(&key, offset) => result?,
            };

            let report = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                report = self.copier.copy(&mut stream, &mut payload) => report,
            };
            drop(stream);

            match classify(report) {
                Attempt::Complete => break,
                Attempt::Resumed { copied } => {
                    offset += copied;
                    warn!(id, offset, "transient fault, resuming bundle download");
                    if let Some(observer) = &self.observer {
                        observer.download_resumed(id, offset);
                    }
                }
                Attempt::Stalled(cause) => {
                    warn!(id, offset, %cause, "bundle download made no progress");
                    return Err(TransferError::NoProgress);
                }
            }
        }

        info!(id, bytes = payload.len(), attempts, "bundle download complete");
        if let Some(observer) = &self.observer {
            observer.download_finished(id, payload.len() as u64, attempts);
        }
        Ok(BundleReader::new(payload))
    }
}
