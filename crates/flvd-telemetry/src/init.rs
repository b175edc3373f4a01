//! Telemetry initialisation primitives and logging configuration.
//!
//! # Design
//! - Centralises logging setup (fmt or JSON) with a single entry point.
//! - Records the build SHA once to avoid inconsistencies across modules.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    BUILD_SHA.set(config.build_sha.to_string()).ok();

    let registry = tracing_subscriber::registry().with(build_env_filter(config.level));
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA
        .get()
        .map_or(option_env!("FLVD_BUILD_SHA").unwrap_or("dev"), String::as_str)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level string used when `RUST_LOG` is unset (e.g., `info`, `debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded in structured logs.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

impl LoggingConfig<'_> {
    /// Default configuration with an explicit format override.
    #[must_use]
    pub fn with_format(format: Option<LogFormat>) -> Self {
        Self {
            format: format.unwrap_or_else(LogFormat::infer),
            ..Self::default()
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable, pretty-printed logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_format_overrides_inferred_default() {
        assert_eq!(
            LoggingConfig::with_format(Some(LogFormat::Json)).format,
            LogFormat::Json
        );
        assert_eq!(LoggingConfig::with_format(None).format, LogFormat::infer());
        assert_eq!(LoggingConfig::default().level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn init_logging_installs_once_and_keeps_first_build_sha() {
        let first = LoggingConfig {
            level: "info",
            format: LogFormat::Pretty,
            build_sha: "sha-first",
        };
        let second = LoggingConfig {
            build_sha: "sha-second",
            ..first.clone()
        };
        assert!(init_logging(&first).is_ok());
        assert!(init_logging(&second).is_err());
        assert_eq!(build_sha(), "sha-first");
    }
}
