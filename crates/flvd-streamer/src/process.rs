use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use flvd_core::{FetchStatus, StreamFetcher};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{StreamerError, StreamerResult};

/// Client binary used when none is configured.
pub const DEFAULT_BINARY: &str = "flvstreamer";

/// Runs an external `flvstreamer`-compatible binary once per fetch.
///
/// The argument vector is `[extra args...] -r <url> -o <output>`. The exit
/// code is returned verbatim; a signal-terminated or shutdown-killed client
/// reports [`FetchStatus::INCOMPLETE`], and a client that cannot be launched
/// or reaped reports [`FetchStatus::LAUNCH_FAILED`].
#[derive(Debug, Clone)]
pub struct ProcessFetcher {
    binary: PathBuf,
    extra_args: Vec<String>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Default for ProcessFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl ProcessFetcher {
    /// Fetcher for `binary`, resolved through `PATH` when not absolute.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            shutdown: None,
        }
    }

    /// Append arguments placed before `-r`.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Kill running clients once `shutdown` flips to `true`.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Configured client binary.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Full argument vector passed to the client for one fetch.
    #[must_use]
    pub fn command_args(&self, url: &str, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.extra_args.iter().map(OsString::from).collect();
        args.push("-r".into());
        args.push(url.into());
        args.push("-o".into());
        args.push(output_path.as_os_str().to_os_string());
        args
    }

    async fn run(&self, url: &str, output_path: &Path) -> StreamerResult<FetchStatus> {
        if self.shutdown.as_ref().is_some_and(|shutdown| *shutdown.borrow()) {
            debug!("shutdown in progress; streaming client not started");
            return Ok(FetchStatus::INCOMPLETE);
        }
        let mut command = Command::new(&self.binary);
        command
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .args(self.command_args(url, output_path));
        let mut child = command.spawn().map_err(|source| StreamerError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;
        debug!(
            pid = ?child.id(),
            binary = %self.binary.display(),
            "streaming client started"
        );

        let exit = match self.shutdown.clone() {
            Some(shutdown) => match self.wait_or_shutdown(&mut child, shutdown).await {
                Some(exit) => exit,
                None => return Ok(FetchStatus::INCOMPLETE),
            },
            None => child.wait().await,
        };
        let exit = exit.map_err(|source| StreamerError::Wait {
            binary: self.binary.clone(),
            source,
        })?;
        Ok(exit_status(exit))
    }

    /// Wait for the child, or kill it when shutdown is signalled (`None`).
    async fn wait_or_shutdown(
        &self,
        child: &mut Child,
        mut shutdown: watch::Receiver<bool>,
    ) -> Option<std::io::Result<ExitStatus>> {
        if *shutdown.borrow_and_update() {
            terminate(child, &self.binary).await;
            return None;
        }
        loop {
            tokio::select! {
                exit = child.wait() => return Some(exit),
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow_and_update() => {
                        terminate(child, &self.binary).await;
                        return None;
                    }
                    Ok(()) => {}
                    Err(_) => return Some(child.wait().await),
                },
            }
        }
    }
}

async fn terminate(child: &mut Child, binary: &Path) {
    info!(
        pid = ?child.id(),
        binary = %binary.display(),
        "shutdown requested; killing streaming client"
    );
    if let Err(err) = child.kill().await {
        warn!(error = %err, "failed to kill streaming client");
    }
}

fn exit_status(exit: ExitStatus) -> FetchStatus {
    exit.code()
        .map_or(FetchStatus::INCOMPLETE, FetchStatus::from_code)
}

#[async_trait]
impl StreamFetcher for ProcessFetcher {
    async fn fetch(&self, url: &str, output_path: &Path) -> FetchStatus {
        match self.run(url, output_path).await {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    error = %err,
                    cause = ?std::error::Error::source(&err),
                    binary = %err.binary().display(),
                    "streaming client could not be run"
                );
                FetchStatus::LAUNCH_FAILED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn command_args_place_extra_args_before_url_and_output() {
        let fetcher = ProcessFetcher::default().with_args(["--live", "-q"]);
        let args = fetcher.command_args("rtmp://host/app/clip", Path::new("/out/clip.flv"));
        assert_eq!(
            args,
            ["--live", "-q", "-r", "rtmp://host/app/clip", "-o", "/out/clip.flv"]
                .map(OsString::from)
                .to_vec()
        );
        assert_eq!(fetcher.binary(), Path::new(DEFAULT_BINARY));
    }

    #[tokio::test]
    async fn missing_binary_reports_launch_failure() {
        let fetcher = ProcessFetcher::new("/nonexistent/flvd-test/flvstreamer");
        let status = fetcher.fetch("rtmp://host/x", Path::new("/tmp/x.flv")).await;
        assert_eq!(status, FetchStatus::LAUNCH_FAILED);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::time::Duration;

        use anyhow::Result;
        use flvd_test_support::fixtures::{SHELL, shell_client_args};

        fn shell_fetcher(script: &str) -> ProcessFetcher {
            ProcessFetcher::new(SHELL).with_args(shell_client_args(script))
        }

        #[tokio::test]
        async fn client_receives_url_and_output_flags() -> Result<()> {
            let temp = tempfile::tempdir()?;
            let output = temp.path().join("clip1.flv");
            let fetcher = shell_fetcher(r#"printf '%s\n' "$@" > "$5""#).with_args(["--live"]);

            let status = fetcher.fetch("http://host/stream/clip1", &output).await;

            assert_eq!(status, FetchStatus::SUCCESS);
            let recorded = std::fs::read_to_string(&output)?;
            assert_eq!(
                recorded,
                format!("--live\n-r\nhttp://host/stream/clip1\n-o\n{}\n", output.display())
            );
            Ok(())
        }

        #[tokio::test]
        async fn exit_codes_pass_through_verbatim() {
            for code in [1, 2, 7, 42] {
                let fetcher = shell_fetcher(&format!("exit {code}"));
                let status = fetcher.fetch("u", Path::new("/tmp/unused.flv")).await;
                assert_eq!(status.code(), code);
            }
        }

        #[tokio::test]
        async fn signal_termination_reports_incomplete() {
            let fetcher = shell_fetcher("kill -9 $$");
            let status = fetcher.fetch("u", Path::new("/tmp/unused.flv")).await;
            assert_eq!(status, FetchStatus::INCOMPLETE);
        }

        #[tokio::test]
        async fn shutdown_kills_running_client() -> Result<()> {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let fetcher = shell_fetcher("exec sleep 30").with_shutdown(shutdown_rx);
            let task = tokio::spawn(async move {
                fetcher.fetch("u", Path::new("/tmp/unused.flv")).await
            });

            tokio::time::sleep(Duration::from_millis(100)).await;
            shutdown_tx.send(true)?;

            let status = tokio::time::timeout(Duration::from_secs(5), task).await??;
            assert_eq!(status, FetchStatus::INCOMPLETE);
            Ok(())
        }

        #[tokio::test]
        async fn shutdown_already_signalled_skips_the_run() -> Result<()> {
            let temp = tempfile::tempdir()?;
            let output = temp.path().join("late.flv");
            let (_shutdown_tx, shutdown_rx) = watch::channel(true);
            let fetcher = shell_fetcher(r#"touch "$4""#).with_shutdown(shutdown_rx);

            let status = fetcher.fetch("u", &output).await;

            assert_eq!(status, FetchStatus::INCOMPLETE);
            assert!(!output.exists());
            Ok(())
        }

        #[tokio::test]
        async fn dropped_shutdown_sender_keeps_waiting_for_client() {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            drop(shutdown_tx);
            let fetcher = shell_fetcher("exit 3").with_shutdown(shutdown_rx);
            let status = fetcher.fetch("u", Path::new("/tmp/unused.flv")).await;
            assert_eq!(status.code(), 3);
        }
    }
}
