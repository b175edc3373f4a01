//! Recording stand-in for the external streaming client.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use flvd_core::{FetchStatus, StreamFetcher};
use tokio::sync::{Semaphore, watch};

/// Arguments observed by one `fetch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    /// Stream address the client was asked to retrieve.
    pub url: String,
    /// Output path the client was asked to write.
    pub output_path: PathBuf,
}

/// Fake client that records calls, returns a scripted code, and tracks
/// how many fetches overlap.
#[derive(Debug)]
pub struct RecordingFetcher {
    status: AtomicI32,
    payload: Option<Vec<u8>>,
    delay: Option<Duration>,
    gate: Option<Semaphore>,
    calls: Mutex<Vec<FetchCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: watch::Sender<usize>,
}

impl RecordingFetcher {
    /// Fetcher that returns `status` for every call.
    #[must_use]
    pub fn returning(status: impl Into<FetchStatus>) -> Self {
        let (started, _) = watch::channel(0);
        Self {
            status: AtomicI32::new(status.into().code()),
            payload: None,
            delay: None,
            gate: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started,
        }
    }

    /// Write `payload` to the output path before returning.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Hold each call open for `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block each call until [`Self::release`] hands out a permit.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let `count` gated calls proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Change the code returned by subsequent calls.
    pub fn set_status(&self, status: impl Into<FetchStatus>) {
        self.status.store(status.into().code(), Ordering::SeqCst);
    }

    /// Snapshot of every call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Highest number of calls that were running at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of calls currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` calls have started.
    pub async fn wait_for_started(&self, count: usize) {
        let mut started = self.started.subscribe();
        started.wait_for(|seen| *seen >= count).await.ok();
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StreamFetcher for RecordingFetcher {
    async fn fetch(&self, url: &str, output_path: &Path) -> FetchStatus {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FetchCall {
                url: url.to_string(),
                output_path: output_path.to_path_buf(),
            });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.started.send_modify(|seen| *seen += 1);

        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(payload) = &self.payload
            && tokio::fs::write(output_path, payload).await.is_err()
        {
            return FetchStatus::FAILED;
        }

        FetchStatus::from_code(self.status.load(Ordering::SeqCst))
    }
}
