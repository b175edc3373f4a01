//! Environment lookup for [`ServiceConfig`].

use std::path::PathBuf;

use tracing::debug;

use crate::error::ConfigResult;
use crate::model::{
    FetcherKind, LogFormatSetting, MAX_CONCURRENT_FETCHES_LIMIT, SamePathPolicy, ServiceConfig,
};
use crate::validate::{
    parse_bind_addr, parse_choice, parse_flag, parse_port, parse_positive, parse_secs,
};

/// Environment variable names.
pub mod env {
    /// Listener IP address.
    pub const BIND_ADDR: &str = "FLVD_BIND_ADDR";
    /// Listener port.
    pub const HTTP_PORT: &str = "FLVD_HTTP_PORT";
    /// Permit a non-loopback bind address.
    pub const ALLOW_REMOTE: &str = "FLVD_ALLOW_REMOTE";
    /// `process` or `stub`.
    pub const FETCHER: &str = "FLVD_FETCHER";
    /// External client binary.
    pub const STREAMER_BIN: &str = "FLVD_STREAMER_BIN";
    /// Whitespace-separated extra client arguments.
    pub const STREAMER_ARGS: &str = "FLVD_STREAMER_ARGS";
    /// `wait` or `reject`.
    pub const SAME_PATH_POLICY: &str = "FLVD_SAME_PATH_POLICY";
    /// Positive cap on concurrent client runs.
    pub const MAX_CONCURRENT_FETCHES: &str = "FLVD_MAX_CONCURRENT_FETCHES";
    /// Router-side input validation toggle.
    pub const STRICT_INPUTS: &str = "FLVD_STRICT_INPUTS";
    /// `json` or `pretty`.
    pub const LOG_FORMAT: &str = "FLVD_LOG_FORMAT";
    /// Shutdown grace period in seconds.
    pub const SHUTDOWN_GRACE_SECS: &str = "FLVD_SHUTDOWN_GRACE_SECS";
}

impl ServiceConfig {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidField` naming the first variable whose value
    /// does not parse.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup. Unset and blank
    /// variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidField` naming the first variable whose value
    /// does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(env::BIND_ADDR) {
            config.bind_addr = parse_bind_addr(env::BIND_ADDR, &value)?;
        }
        if let Some(value) = get(env::HTTP_PORT) {
            config.http_port = parse_port(env::HTTP_PORT, &value)?;
        }
        if let Some(value) = get(env::ALLOW_REMOTE) {
            config.allow_remote = parse_flag(env::ALLOW_REMOTE, &value)?;
        }
        if let Some(value) = get(env::FETCHER) {
            config.fetcher = parse_choice(env::FETCHER, &value, FetcherKind::parse)?;
        }
        if let Some(value) = get(env::STREAMER_BIN) {
            config.streamer_bin = PathBuf::from(value.trim());
        }
        if let Some(value) = get(env::STREAMER_ARGS) {
            config.streamer_args = value.split_whitespace().map(str::to_string).collect();
        }
        if let Some(value) = get(env::SAME_PATH_POLICY) {
            config.same_path_policy =
                parse_choice(env::SAME_PATH_POLICY, &value, SamePathPolicy::parse)?;
        }
        if let Some(value) = get(env::MAX_CONCURRENT_FETCHES) {
            config.max_concurrent_fetches =
                Some(parse_positive(
                    env::MAX_CONCURRENT_FETCHES,
                    &value,
                    MAX_CONCURRENT_FETCHES_LIMIT,
                )?);
        }
        if let Some(value) = get(env::STRICT_INPUTS) {
            config.strict_inputs = parse_flag(env::STRICT_INPUTS, &value)?;
        }
        if let Some(value) = get(env::LOG_FORMAT) {
            config.log_format = Some(parse_choice(
                env::LOG_FORMAT,
                &value,
                LogFormatSetting::parse,
            )?);
        }
        if let Some(value) = get(env::SHUTDOWN_GRACE_SECS) {
            config.shutdown_grace = parse_secs(env::SHUTDOWN_GRACE_SECS, &value)?;
        }

        debug!(
            bind_addr = %config.bind_addr,
            http_port = config.http_port,
            fetcher = config.fetcher.as_str(),
            same_path_policy = config.same_path_policy.as_str(),
            "service configuration loaded"
        );
        Ok(config)
    }
}
