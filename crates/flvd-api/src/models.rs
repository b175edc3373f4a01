//! Wire types shared by the router and its clients.

use flvd_core::{FetchStatus, RemoveStatus};
use serde::{Deserialize, Serialize};

pub use flvd_core::{DownloadRequest, RemoveRequest};

/// RFC9457-compatible problem document returned on transport faults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI reference.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary of the problem class.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Per-field validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON pointer to the offending field (e.g. `/title`).
    pub pointer: String,
    /// Machine-readable reason.
    pub message: String,
}

/// Body of every successful RPC: the integer code and its label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    /// Status code exactly as the orchestrator returned it.
    pub status: i32,
    /// Stable label for the code (`success`, `not_found`, ...).
    pub outcome: String,
}

impl From<FetchStatus> for StatusResponse {
    fn from(status: FetchStatus) -> Self {
        Self {
            status: status.code(),
            outcome: status.label().to_string(),
        }
    }
}

impl From<RemoveStatus> for StatusResponse {
    fn from(status: RemoveStatus) -> Self {
        Self {
            status: status.code(),
            outcome: status.label().to_string(),
        }
    }
}
