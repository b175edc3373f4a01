use std::path::Path;

use async_trait::async_trait;
use flvd_core::{FetchStatus, StreamFetcher};
use tracing::{debug, warn};

/// Minimal FLV file header (signature, version 1, audio+video, header size 9)
/// followed by the first zero `PreviousTagSize`.
pub const FLV_HEADER: &[u8] = b"FLV\x01\x05\x00\x00\x00\x09\x00\x00\x00\x00";

/// Fetcher that never touches the network: it writes an optional payload and
/// returns a fixed code.
#[derive(Debug, Clone)]
pub struct StubFetcher {
    status: FetchStatus,
    payload: Option<Vec<u8>>,
}

impl Default for StubFetcher {
    fn default() -> Self {
        Self {
            status: FetchStatus::SUCCESS,
            payload: Some(FLV_HEADER.to_vec()),
        }
    }
}

impl StubFetcher {
    /// Stub returning `status` without writing anything.
    #[must_use]
    pub fn returning(status: impl Into<FetchStatus>) -> Self {
        Self {
            status: status.into(),
            payload: None,
        }
    }

    /// Write `payload` to the output path on every fetch.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

#[async_trait]
impl StreamFetcher for StubFetcher {
    async fn fetch(&self, url: &str, output_path: &Path) -> FetchStatus {
        debug!(url, output_path = %output_path.display(), "stub fetch");
        if let Some(payload) = &self.payload
            && let Err(err) = tokio::fs::write(output_path, payload).await
        {
            warn!(error = %err, output_path = %output_path.display(), "stub payload write failed");
            return FetchStatus::FAILED;
        }
        self.status
    }
}
