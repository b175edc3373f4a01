//! Error types for download core services.

use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for download and removal faults.
///
/// In-domain outcomes (fetch codes, removal statuses) are never expressed as
/// errors; this type only covers conditions where no status code applies.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Another download is already writing to the same output path.
    #[error("output path busy")]
    OutputBusy {
        /// Output path that is currently being written.
        path: PathBuf,
    },
    /// A request argument was rejected before dispatch.
    #[error("invalid download input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason describing the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The operation faulted outside the status-code contract.
    #[error("download operation failed")]
    OperationFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Output path involved when available.
        path: Option<PathBuf>,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Convenience alias for download core results.
pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn download_error_messages_are_constant() {
        let busy = DownloadError::OutputBusy {
            path: PathBuf::from("/tmp/out/clip1.flv"),
        };
        assert_eq!(busy.to_string(), "output path busy");
        assert!(busy.source().is_none());

        let invalid = DownloadError::InvalidInput {
            field: "title",
            reason: "empty",
            value: None,
        };
        assert_eq!(invalid.to_string(), "invalid download input");

        let failed = DownloadError::OperationFailed {
            operation: "download.join",
            path: None,
            source: Box::new(io::Error::other("join")),
        };
        assert_eq!(failed.to_string(), "download operation failed");
        assert!(failed.source().is_some());
    }
}
