//! Download orchestrator: composes names, serializes same-path downloads, and
//! maps filesystem results onto removal codes.
//!
//! # Design
//! - Downloads to one output path never overlap. A per-path async mutex is
//!   handed out from a table; entries are dropped once nobody holds or waits
//!   on them.
//! - The path lock is taken before a global permit so a queued same-path
//!   download never sits on a slot of the concurrency cap.
//! - Removals take no lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use flvd_config::SamePathPolicy;
use flvd_core::{
    DownloadError, DownloadInspector, DownloadRequest, DownloadResult, DownloadWorkflow,
    FetchStatus, RemoveRequest, RemoveStatus, StreamFetcher,
};
use flvd_fsops::FsOpsError;
use flvd_telemetry::{CallContext, Metrics};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

/// Workflow implementation backing the RPC surface.
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn StreamFetcher>,
    locks: Arc<PathLocks>,
    limiter: Option<Arc<Semaphore>>,
    policy: SamePathPolicy,
    active: AtomicUsize,
    telemetry: Metrics,
}

impl DownloadOrchestrator {
    /// Orchestrator over `fetcher` using the default `wait` policy and no cap.
    #[must_use]
    pub fn new(fetcher: Arc<dyn StreamFetcher>, telemetry: Metrics) -> Self {
        Self {
            fetcher,
            locks: Arc::new(PathLocks::default()),
            limiter: None,
            policy: SamePathPolicy::default(),
            active: AtomicUsize::new(0),
            telemetry,
        }
    }

    /// Choose what happens when a download targets a path already being written.
    #[must_use]
    pub const fn with_same_path_policy(mut self, policy: SamePathPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cap the number of concurrent client runs; `None` leaves them unbounded.
    ///
    /// Limits above [`Semaphore::MAX_PERMITS`] are clamped to it.
    #[must_use]
    pub fn with_max_concurrent(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit
            .map(|permits| Arc::new(Semaphore::new(permits.min(Semaphore::MAX_PERMITS))));
        self
    }

    async fn run_download(&self, request: &DownloadRequest) -> DownloadResult<FetchStatus> {
        let url = request.stream_url();
        let output_path = request.output_path();
        let call = CallContext::current();
        let request_id = call.as_ref().map_or("", CallContext::request_id);

        let waiting = GaugeLease::waiting(&self.telemetry);
        let Some(_path_lock) = self.locks.acquire(&output_path, self.policy).await else {
            self.telemetry.inc_same_path_rejection();
            warn!(
                request_id = %request_id,
                output_path = %output_path.display(),
                "download refused; output path busy"
            );
            return Err(DownloadError::OutputBusy { path: output_path });
        };
        let _permit = self.acquire_permit(&output_path).await?;
        drop(waiting);

        let _running = ActiveLease::enter(&self.active, &self.telemetry);
        debug!(request_id = %request_id, url = %url, output_path = %output_path.display(), "starting client");
        let started = Instant::now();
        let status = self.fetcher.fetch(&url, &output_path).await;
        self.telemetry.observe_download(status.label(), started.elapsed());

        info!(
            request_id = %request_id,
            url = %url,
            output_path = %output_path.display(),
            status = status.code(),
            outcome = status.label(),
            "download finished"
        );
        Ok(status)
    }

    async fn acquire_permit(
        &self,
        output_path: &Path,
    ) -> DownloadResult<Option<OwnedSemaphorePermit>> {
        let Some(limiter) = &self.limiter else {
            return Ok(None);
        };
        Arc::clone(limiter)
            .acquire_owned()
            .await
            .map(Some)
            .map_err(|err| DownloadError::OperationFailed {
                operation: "download.acquire_permit",
                path: Some(output_path.to_path_buf()),
                source: Box::new(err),
            })
    }

    async fn run_remove(&self, request: &RemoveRequest) -> RemoveStatus {
        let output_path = request.output_path();
        let call = CallContext::current();
        let request_id = call.as_ref().map_or("", CallContext::request_id);
        let outcome = flvd_fsops::remove_output(&output_path).await;
        self.telemetry.inc_removal(outcome.status.label());

        match (outcome.status, &outcome.cause) {
            (RemoveStatus::RemoveFailed, cause) => warn!(
                request_id = %request_id,
                output_path = %output_path.display(),
                status = outcome.status.code(),
                operation = cause.as_ref().map(FsOpsError::operation),
                kind = cause.as_ref().map(|err| tracing::field::debug(err.kind())),
                error = cause.as_ref().map(tracing::field::display),
                "removal failed"
            ),
            (status, _) => info!(
                request_id = %request_id,
                output_path = %output_path.display(),
                status = status.code(),
                outcome = status.label(),
                "removal finished"
            ),
        }
        outcome.status
    }
}

#[async_trait]
impl DownloadWorkflow for DownloadOrchestrator {
    async fn download(&self, request: DownloadRequest) -> Result<FetchStatus> {
        Ok(self.run_download(&request).await?)
    }

    async fn remove(&self, request: RemoveRequest) -> Result<RemoveStatus> {
        Ok(self.run_remove(&request).await)
    }
}

impl DownloadInspector for DownloadOrchestrator {
    fn active_downloads(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Table of per-output-path locks.
#[derive(Default)]
struct PathLocks {
    entries: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    /// Lock `path` according to `policy`; `None` means the path is busy and
    /// the policy is `reject`.
    async fn acquire(self: &Arc<Self>, path: &Path, policy: SamePathPolicy) -> Option<PathLease> {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(path.to_path_buf()).or_default())
        };
        // Built before waiting so a cancelled acquire still prunes the entry.
        let mut lease = PathLease {
            table: Arc::clone(self),
            path: path.to_path_buf(),
            guard: None,
        };
        lease.guard = match policy {
            SamePathPolicy::Wait => Some(entry.lock_owned().await),
            SamePathPolicy::Reject => entry.try_lock_owned().ok(),
        };
        lease.guard.is_some().then_some(lease)
    }

    fn release(&self, path: &Path) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries
            .get(path)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            entries.remove(path);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct PathLease {
    table: Arc<PathLocks>,
    path: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathLease {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.table.release(&self.path);
    }
}

/// Keeps the waiting gauge raised until dropped.
struct GaugeLease<'a> {
    telemetry: &'a Metrics,
}

impl<'a> GaugeLease<'a> {
    fn waiting(telemetry: &'a Metrics) -> Self {
        telemetry.add_waiting_downloads(1);
        Self { telemetry }
    }
}

impl Drop for GaugeLease<'_> {
    fn drop(&mut self) {
        self.telemetry.add_waiting_downloads(-1);
    }
}

/// Counts one running client for the inspector and the gauge.
struct ActiveLease<'a> {
    active: &'a AtomicUsize,
    telemetry: &'a Metrics,
}

impl<'a> ActiveLease<'a> {
    fn enter(active: &'a AtomicUsize, telemetry: &'a Metrics) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        telemetry.add_active_downloads(1);
        Self { active, telemetry }
    }
}

impl Drop for ActiveLease<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.telemetry.add_active_downloads(-1);
    }
}
