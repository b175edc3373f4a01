//! Typed service settings.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default listener port.
pub const DEFAULT_HTTP_PORT: u16 = 7071;
/// Default client binary.
pub const DEFAULT_STREAMER_BIN: &str = "flvstreamer";
/// Default wait for in-flight calls after shutdown begins.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
/// Largest accepted `FLVD_MAX_CONCURRENT_FETCHES`; equals the permit limit of
/// a tokio semaphore.
pub const MAX_CONCURRENT_FETCHES_LIMIT: usize = usize::MAX >> 3;

/// Rule applied when a download targets an output path that is already being
/// written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamePathPolicy {
    /// Queue behind the running download, then run.
    #[default]
    Wait,
    /// Refuse immediately.
    Reject,
}

impl SamePathPolicy {
    /// Parse the environment representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wait" => Some(Self::Wait),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wait => "wait",
            Self::Reject => "reject",
        }
    }
}

/// Streaming client implementation selected at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetcherKind {
    /// Run the external client binary.
    #[default]
    Process,
    /// In-memory stub that writes a placeholder file.
    Stub,
}

impl FetcherKind {
    /// Parse the environment representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "process" => Some(Self::Process),
            "stub" => Some(Self::Stub),
            _ => None,
        }
    }

    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Stub => "stub",
        }
    }
}

/// Explicit log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormatSetting {
    /// Parse the environment representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Immutable settings for one service process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    /// Listener IP address.
    pub bind_addr: IpAddr,
    /// Listener port.
    pub http_port: u16,
    /// Permit a non-loopback bind address.
    pub allow_remote: bool,
    /// Streaming client implementation.
    pub fetcher: FetcherKind,
    /// Client binary for [`FetcherKind::Process`].
    pub streamer_bin: PathBuf,
    /// Extra client arguments placed before `-r`.
    pub streamer_args: Vec<String>,
    /// Same-path download rule.
    pub same_path_policy: SamePathPolicy,
    /// Cap on concurrent client runs; `None` means unlimited.
    pub max_concurrent_fetches: Option<usize>,
    /// Reject unsafe titles and empty prefixes at the router.
    pub strict_inputs: bool,
    /// Log format override; inferred from the build profile when `None`.
    pub log_format: Option<LogFormatSetting>,
    /// Max wait for in-flight calls after shutdown begins.
    #[serde(with = "secs")]
    pub shutdown_grace: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: DEFAULT_HTTP_PORT,
            allow_remote: false,
            fetcher: FetcherKind::default(),
            streamer_bin: PathBuf::from(DEFAULT_STREAMER_BIN),
            streamer_args: Vec::new(),
            same_path_policy: SamePathPolicy::default(),
            max_concurrent_fetches: None,
            strict_inputs: false,
            log_format: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ServiceConfig {
    /// Socket address the API listener binds to.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

mod secs {
    use std::time::Duration;

    use serde::Serializer;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
