//! Fetcher and workflow traits implemented by adapters and the orchestrator.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{DownloadRequest, RemoveRequest};
use crate::status::{FetchStatus, RemoveStatus};

/// External streaming client: fetch one stream into one file.
///
/// The call blocks for as long as the remote stream lasts. Implementations
/// report every outcome as a status code; there is no error path. On a
/// non-zero code the output file may be absent, empty, or partial.
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    /// Retrieve `url` into `output_path` and report the client's code.
    async fn fetch(&self, url: &str, output_path: &Path) -> FetchStatus;
}

#[async_trait]
impl<T> StreamFetcher for Arc<T>
where
    T: StreamFetcher + ?Sized,
{
    async fn fetch(&self, url: &str, output_path: &Path) -> FetchStatus {
        (**self).fetch(url, output_path).await
    }
}

/// Workflow façade exposed to the request router.
///
/// `Err` is reserved for faults outside the status-code contract; every
/// in-domain outcome is returned as `Ok`.
#[async_trait]
pub trait DownloadWorkflow: Send + Sync {
    /// Download the stream described by `request` and return the client code.
    async fn download(&self, request: DownloadRequest) -> anyhow::Result<FetchStatus>;

    /// Remove the output file a matching download would have produced.
    async fn remove(&self, request: RemoveRequest) -> anyhow::Result<RemoveStatus>;
}

/// Inspector used by health endpoints.
pub trait DownloadInspector: Send + Sync {
    /// Number of external client runs currently in flight.
    fn active_downloads(&self) -> usize;
}
