//! Status-code taxonomy shared by the download and removal paths.
//!
//! # Design
//! - Download codes belong to the external streaming client and are passed
//!   through verbatim; the named constants only document the codes the
//!   bundled client is known to produce.
//! - Removal codes form a closed set owned by the orchestrator.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Exit code reported by the external streaming client for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FetchStatus(i32);

impl FetchStatus {
    /// Stream fully retrieved and written to the output path.
    pub const SUCCESS: Self = Self(0);
    /// The client gave up (connection, protocol, or I/O failure).
    pub const FAILED: Self = Self(1);
    /// The transfer stopped before the stream ended (also used on shutdown).
    pub const INCOMPLETE: Self = Self(2);
    /// The client could not be started or awaited.
    pub const LAUNCH_FAILED: Self = Self(-1);

    /// Wrap a raw client code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// Raw integer surfaced to callers.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Whether the client reported a complete transfer.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Stable label used in logs, metrics, and API responses.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            0 => "success",
            1 => "failed",
            2 => "incomplete",
            -1 => "launch_failed",
            _ => "client_error",
        }
    }
}

impl From<i32> for FetchStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl From<FetchStatus> for i32 {
    fn from(status: FetchStatus) -> Self {
        status.0
    }
}

impl Display for FetchStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.0, self.label())
    }
}

/// Outcome of a removal call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveStatus {
    /// The output file existed and was deleted.
    Removed,
    /// The output file existed but could not be deleted.
    RemoveFailed,
    /// No output file exists for the request.
    NotFound,
}

impl RemoveStatus {
    /// Raw integer surfaced to callers.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Removed => 0,
            Self::RemoveFailed => 1,
            Self::NotFound => 2,
        }
    }

    /// Parse a raw removal code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Removed),
            1 => Some(Self::RemoveFailed),
            2 => Some(Self::NotFound),
            _ => None,
        }
    }

    /// Stable label used in logs, metrics, and API responses.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Removed => "removed",
            Self::RemoveFailed => "remove_failed",
            Self::NotFound => "not_found",
        }
    }
}

impl From<RemoveStatus> for i32 {
    fn from(status: RemoveStatus) -> Self {
        status.code()
    }
}

impl Display for RemoveStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.code(), self.label())
    }
}
