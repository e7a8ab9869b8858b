//! Bundle-manager client façade and configuration.

use std::collections::HashMap;
use std::sync::Arc;

use bundleferry_store::{BundleId, UploadStore};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::DEFAULT_MAX_PAYLOAD_SIZE;
use crate::copy::{ByteCopier, DefaultCopier};
use crate::error::TransferError;

/// Hooks invoked at operation boundaries.
///
/// All methods default to no-ops; the surrounding service implements the
/// ones it wants to count or time. The transfer logic never depends on
/// observer behavior.
pub trait TransferObserver: Send + Sync {
    /// A download attempt hit a transient fault and will resume at `offset`.
    fn download_resumed(&self, _id: BundleId, _offset: u64) {}

    /// A download accumulated the full compressed payload.
    fn download_finished(&self, _id: BundleId, _compressed_bytes: u64, _attempts: u32) {}

    /// An upload posted all chunks and the stitch call succeeded.
    fn upload_finished(&self, _id: BundleId, _chunks: usize, _raw_bytes: u64) {}

    /// An existence check completed for `_ids` bundle ids.
    fn exists_checked(&self, _ids: usize) {}
}

/// Client for the bundle-manager HTTP service.
///
/// Holds only immutable configuration, so one instance can serve
/// arbitrarily many concurrent calls without coordination.
pub struct BundleClient {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoint: String,
    pub(crate) max_payload_size: usize,
    pub(crate) store: Arc<dyn UploadStore>,
    pub(crate) copier: Arc<dyn ByteCopier>,
    pub(crate) observer: Option<Arc<dyn TransferObserver>>,
}

impl BundleClient {
    /// Creates a client for the bundle manager at `endpoint`, reading raw
    /// uploads from `store`.
    pub fn new(endpoint: impl Into<String>, store: Arc<dyn UploadStore>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            endpoint,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            store,
            copier: Arc::new(DefaultCopier),
            observer: None,
        }
    }

    /// Sets the maximum raw chunk size in bytes.
    ///
    /// 0 keeps [`DEFAULT_MAX_PAYLOAD_SIZE`](crate::DEFAULT_MAX_PAYLOAD_SIZE).
    pub fn with_max_payload_size(mut self, bytes: usize) -> Self {
        if bytes > 0 {
            self.max_payload_size = bytes;
        }
        self
    }

    /// Replaces the byte-copy primitive used by downloads.
    pub fn with_copier(mut self, copier: Arc<dyn ByteCopier>) -> Self {
        self.copier = copier;
        self
    }

    /// Attaches an observer invoked at operation boundaries.
    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Checks which of `ids` exist at the endpoint, in one batched request.
    ///
    /// The returned map covers every requested id; a response that omits
    /// one fails the whole call with [`TransferError::MissingId`].
    pub async fn exists(
        &self,
        cancel: &CancellationToken,
        ids: &[BundleId],
    ) -> Result<HashMap<BundleId, bool>, TransferError> {
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/exists?ids={joined}", self.endpoint);

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            result = self.http.get(&url).send() => result?,
        };
        Self::ensure_success("/exists", resp.status())?;

        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            result = resp.bytes() => result?,
        };
        let body: HashMap<String, bool> = serde_json::from_slice(&bytes)?;

        let mut present = HashMap::with_capacity(ids.len());
        for id in ids {
            let value = body
                .get(&id.to_string())
                .copied()
                .ok_or(TransferError::MissingId(*id))?;
            present.insert(*id, value);
        }

        debug!(ids = ids.len(), "bundle existence checked");
        if let Some(observer) = &self.observer {
            observer.exists_checked(ids.len());
        }
        Ok(present)
    }

    /// POSTs `body` to `route` and fails on a non-2xx status.
    pub(crate) async fn post(
        &self,
        cancel: &CancellationToken,
        route: &str,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, TransferError> {
        let url = format!("{}{route}", self.endpoint);
        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            result = self.http.post(&url).body(body).send() => result?,
        };
        Self::ensure_success(route, resp.status())?;
        Ok(resp)
    }

    pub(crate) fn ensure_success(
        route: &str,
        status: reqwest::StatusCode,
    ) -> Result<(), TransferError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(TransferError::Endpoint {
                route: route.to_string(),
                status: status.as_u16(),
            })
        }
    }
}
