//! Filesystem side of output-file removal.
#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

pub mod error;

use std::io;
use std::path::Path;

use flvd_core::RemoveStatus;
use tracing::{debug, warn};

pub use error::{FsOpsError, FsOpsResult};

/// Outcome of a single removal attempt.
#[derive(Debug)]
pub struct RemoveOutcome {
    /// Status code surfaced to the caller.
    pub status: RemoveStatus,
    /// Underlying failure, when the filesystem reported one.
    pub cause: Option<FsOpsError>,
}

impl RemoveOutcome {
    const fn clean(status: RemoveStatus) -> Self {
        Self {
            status,
            cause: None,
        }
    }

    const fn with_cause(status: RemoveStatus, cause: FsOpsError) -> Self {
        Self {
            status,
            cause: Some(cause),
        }
    }
}

/// Probe whether an output file exists at `path` (symlinks are followed).
///
/// # Errors
///
/// Returns an error when existence cannot be determined, e.g. because the
/// parent directory is not searchable.
pub async fn probe_output(path: &Path) -> FsOpsResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|err| FsOpsError::io("probe_output", path, err))
}

/// Delete the output file at `path` and map the result onto the removal codes.
///
/// - absent (or existence undeterminable) → `NotFound`
/// - deleted → `Removed`
/// - vanished between probe and delete → `NotFound`
/// - any other delete failure (permissions, lock, directory) → `RemoveFailed`
///
/// Never fails: every filesystem condition degrades to a status.
pub async fn remove_output(path: &Path) -> RemoveOutcome {
    match probe_output(path).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(path = %path.display(), "output file absent");
            return RemoveOutcome::clean(RemoveStatus::NotFound);
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "could not determine output file existence; reporting not found"
            );
            return RemoveOutcome::with_cause(RemoveStatus::NotFound, err);
        }
    }

    match tokio::fs::remove_file(path).await {
        Ok(()) => RemoveOutcome::clean(RemoveStatus::Removed),
        Err(err) if err.kind() == io::ErrorKind::NotFound => RemoveOutcome::with_cause(
            RemoveStatus::NotFound,
            FsOpsError::io("remove_output.delete", path, err),
        ),
        Err(err) => RemoveOutcome::with_cause(
            RemoveStatus::RemoveFailed,
            FsOpsError::io("remove_output.delete", path, err),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn temp_dir() -> Result<TempDir> {
        Ok(tempfile::Builder::new().prefix("flvd-fsops-").tempdir()?)
    }

    #[tokio::test]
    async fn missing_file_reports_not_found() -> Result<()> {
        let temp = temp_dir()?;
        let outcome = remove_output(&temp.path().join("never.flv")).await;
        assert_eq!(outcome.status, RemoveStatus::NotFound);
        assert!(outcome.cause.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn existing_file_is_removed_once() -> Result<()> {
        let temp = temp_dir()?;
        let path = temp.path().join("clip1.flv");
        std::fs::write(&path, b"FLV\x01")?;

        let first = remove_output(&path).await;
        assert_eq!(first.status, RemoveStatus::Removed);
        assert!(!path.exists());

        let second = remove_output(&path).await;
        assert_eq!(second.status, RemoveStatus::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn directory_at_output_path_reports_remove_failed() -> Result<()> {
        let temp = temp_dir()?;
        let path = temp.path().join("clip1.flv");
        std::fs::create_dir(&path)?;
        std::fs::write(path.join("keep"), b"x")?;

        let outcome = remove_output(&path).await;
        assert_eq!(outcome.status, RemoveStatus::RemoveFailed);
        let cause = outcome.cause.ok_or_else(|| anyhow::anyhow!("expected cause"))?;
        assert_eq!(cause.operation(), "remove_output.delete");
        assert!(path.is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn probe_output_tracks_file_presence() -> Result<()> {
        let temp = temp_dir()?;
        let path = temp.path().join("clip2.flv");
        assert!(!probe_output(&path).await?);
        std::fs::write(&path, b"")?;
        assert!(probe_output(&path).await?);
        Ok(())
    }
}
