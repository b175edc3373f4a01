//! # Design
//!
//! - Provide structured, constant-message errors for removal probes.
//! - Capture operation context (paths) so a `remove_failed` status can be
//!   explained in logs without interpolating context into the message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced while probing or deleting output files.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Operation identifier recorded on the error.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Io { operation, .. } => operation,
        }
    }

    /// IO error kind of the underlying failure.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Io { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn fsops_error_helpers_build_variants() {
        let err = FsOpsError::io(
            "remove_output.delete",
            "/tmp/out/clip1.flv",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "fsops io failure");
        assert_eq!(err.operation(), "remove_output.delete");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(err.source().is_some());
    }
}
