//! # Design
//!
//! - Launch and reap failures never reach callers as errors; the fetcher
//!   logs them and reports the launch-failure code.
//! - Keep messages constant; the binary path lives in a field.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for streaming-client operations.
pub type StreamerResult<T> = Result<T, StreamerError>;

/// Errors raised while driving the external streaming client.
#[derive(Debug, Error)]
pub enum StreamerError {
    /// The client binary could not be started.
    #[error("streaming client spawn failed")]
    Spawn {
        /// Binary that failed to start.
        binary: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The running client could not be awaited.
    #[error("streaming client wait failed")]
    Wait {
        /// Binary whose process could not be reaped.
        binary: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl StreamerError {
    /// Binary associated with the failure.
    #[must_use]
    pub fn binary(&self) -> &std::path::Path {
        match self {
            Self::Spawn { binary, .. } | Self::Wait { binary, .. } => binary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn streamer_error_keeps_binary_context() {
        let err = StreamerError::Spawn {
            binary: PathBuf::from("flvstreamer"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "streaming client spawn failed");
        assert_eq!(err.binary(), std::path::Path::new("flvstreamer"));
        assert!(err.source().is_some());
    }
}
