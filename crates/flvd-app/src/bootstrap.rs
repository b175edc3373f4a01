//! Service wiring: configuration, logging, fetcher selection, the HTTP
//! listener, and signal-driven shutdown.

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;

use flvd_api::{ApiServer, ApiServerError, DownloadHandles};
use flvd_config::{FetcherKind, LogFormatSetting, ServiceConfig};
use flvd_core::{DownloadInspector, DownloadWorkflow, StreamFetcher};
use flvd_streamer::{ProcessFetcher, StubFetcher};
use flvd_telemetry::{AppSpanGuard, LogFormat, LoggingConfig, Metrics, set_app_mode};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::orchestrator::DownloadOrchestrator;

/// Dependencies required to bootstrap the service.
pub(crate) struct BootstrapDependencies {
    config: ServiceConfig,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            ServiceConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        Self::from_config(config)
    }

    pub(crate) fn from_config(config: ServiceConfig) -> AppResult<Self> {
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self { config, telemetry })
    }
}

/// Entry point for the service boot sequence.
///
/// # Errors
///
/// Returns an error if configuration is invalid, logging cannot be installed,
/// the listener cannot be bound, or the server loop fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    let logging = LoggingConfig::with_format(dependencies.config.log_format.map(log_format));
    flvd_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let shutdown = shutdown_signal()?;
    run_app_with(dependencies, shutdown).await
}

/// Boot sequence over injected dependencies; returns once `shutdown` resolves
/// and in-flight calls have drained or the grace period ran out.
pub(crate) async fn run_app_with<F>(dependencies: BootstrapDependencies, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send,
{
    let _app_span = AppSpanGuard::enter("serve");
    let addr = dependencies.config.listen_addr();
    enforce_loopback_guard(
        addr.ip(),
        dependencies.config.allow_remote,
        &dependencies.telemetry,
    )?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::api_server("api.bind", ApiServerError::Bind { addr, source }))?;
    serve(listener, dependencies, shutdown).await
}

pub(crate) async fn serve<F>(
    listener: TcpListener,
    dependencies: BootstrapDependencies,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send,
{
    let BootstrapDependencies { config, telemetry } = dependencies;
    info!(
        fetcher = config.fetcher.as_str(),
        same_path_policy = config.same_path_policy.as_str(),
        max_concurrent_fetches = config.max_concurrent_fetches,
        strict_inputs = config.strict_inputs,
        "flvd bootstrap starting"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let fetcher = build_fetcher(&config, stop_rx.clone());
    let orchestrator = Arc::new(
        DownloadOrchestrator::new(fetcher, telemetry.clone())
            .with_same_path_policy(config.same_path_policy)
            .with_max_concurrent(config.max_concurrent_fetches),
    );
    let workflow: Arc<dyn DownloadWorkflow> = orchestrator.clone();
    let inspector: Arc<dyn DownloadInspector> = orchestrator;
    let api = ApiServer::new(
        DownloadHandles::new(workflow, inspector),
        telemetry,
        config.strict_inputs,
    );

    let mut listener_stop = stop_rx;
    let server = api.serve_on(listener, async move {
        // A dropped sender also ends the listener.
        listener_stop.wait_for(|stop| *stop).await.ok();
    });
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::api_server("api.serve", err));
        }
        () = shutdown => {}
    }

    info!(
        grace_ms = u64::try_from(config.shutdown_grace.as_millis()).unwrap_or(u64::MAX),
        "shutdown requested; stopping listener and killing client runs"
    );
    set_app_mode("draining");
    stop_tx.send_replace(true);
    if let Ok(result) = tokio::time::timeout(config.shutdown_grace, server).await {
        result.map_err(|err| AppError::api_server("api.serve", err))?;
        info!("flvd stopped");
    } else {
        warn!("in-flight calls did not drain within the shutdown grace period");
    }
    Ok(())
}

fn build_fetcher(config: &ServiceConfig, shutdown: watch::Receiver<bool>) -> Arc<dyn StreamFetcher> {
    match config.fetcher {
        FetcherKind::Process => {
            let fetcher = ProcessFetcher::new(config.streamer_bin.clone())
                .with_args(config.streamer_args.iter().cloned())
                .with_shutdown(shutdown);
            info!(binary = %fetcher.binary().display(), "using process fetcher");
            Arc::new(fetcher)
        }
        FetcherKind::Stub => {
            warn!("using stub fetcher; no stream will be retrieved");
            Arc::new(StubFetcher::default())
        }
    }
}

const fn log_format(setting: LogFormatSetting) -> LogFormat {
    match setting {
        LogFormatSetting::Json => LogFormat::Json,
        LogFormatSetting::Pretty => LogFormat::Pretty,
    }
}

fn enforce_loopback_guard(bind_addr: IpAddr, allow_remote: bool, telemetry: &Metrics) -> AppResult<()> {
    if !allow_remote && !bind_addr.is_loopback() {
        error!(
            bind_addr = %bind_addr,
            "refusing to bind API listener to non-loopback address without FLVD_ALLOW_REMOTE"
        );
        telemetry.inc_guardrail_violation();
        return Err(AppError::InvalidConfig {
            field: "bind_addr",
            reason: "non_loopback_without_allow_remote",
            value: Some(bind_addr.to_string()),
        });
    }
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
fn shutdown_signal() -> AppResult<impl Future<Output = ()> + Send> {
    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|err| AppError::io("signal.sigterm", err))?;

    Ok(async move {
        #[cfg(unix)]
        tokio::select! {
            result = tokio::signal::ctrl_c() => log_signal("SIGINT", result),
            _ = terminate.recv() => info!(signal = "SIGTERM", "signal received"),
        }
        #[cfg(not(unix))]
        log_signal("ctrl-c", tokio::signal::ctrl_c().await);
    })
}

fn log_signal(signal: &'static str, result: std::io::Result<()>) {
    match result {
        Ok(()) => info!(signal, "signal received"),
        Err(err) => error!(signal, error = %err, "signal listener failed; shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::time::Duration;

    use flvd_config::SamePathPolicy;
    use flvd_test_support::fixtures::destination_prefix;
    use serde_json::{Value, json};
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(10);

    fn stub_config() -> ServiceConfig {
        ServiceConfig {
            http_port: 0,
            fetcher: FetcherKind::Stub,
            shutdown_grace: Duration::from_secs(2),
            ..ServiceConfig::default()
        }
    }

    async fn post(addr: SocketAddr, path: &str, body: &Value) -> anyhow::Result<(u16, Value)> {
        let response = reqwest::Client::new()
            .post(format!("http://{addr}{path}"))
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.json().await?))
    }

    #[test]
    fn loopback_guard_rejects_remote_bind_without_opt_in() -> anyhow::Result<()> {
        let telemetry = Metrics::new()?;
        let remote = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

        let err = enforce_loopback_guard(remote, false, &telemetry)
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected guardrail violation"))?;
        assert!(matches!(
            err,
            AppError::InvalidConfig {
                field: "bind_addr",
                reason: "non_loopback_without_allow_remote",
                ..
            }
        ));
        assert_eq!(telemetry.snapshot().guardrail_violations_total, 1);

        enforce_loopback_guard(remote, true, &telemetry)?;
        enforce_loopback_guard(IpAddr::V4(Ipv4Addr::LOCALHOST), false, &telemetry)?;
        assert_eq!(telemetry.snapshot().guardrail_violations_total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn run_app_with_refuses_remote_bind_before_listening() -> anyhow::Result<()> {
        let config = ServiceConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ..stub_config()
        };
        let result = run_app_with(BootstrapDependencies::from_config(config)?, async {}).await;
        assert!(matches!(result, Err(AppError::InvalidConfig { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn run_app_with_returns_once_shutdown_fires() -> anyhow::Result<()> {
        let dependencies = BootstrapDependencies::from_config(stub_config())?;
        timeout(WAIT, run_app_with(dependencies, async {})).await??;
        Ok(())
    }

    #[tokio::test]
    async fn stub_service_downloads_and_removes_over_http() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let dest = destination_prefix(dir.path());
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let config = ServiceConfig {
            same_path_policy: SamePathPolicy::Reject,
            ..stub_config()
        };
        let (stop, stopped) = oneshot::channel::<()>();
        let service = tokio::spawn(serve(
            listener,
            BootstrapDependencies::from_config(config)?,
            async move {
                stopped.await.ok();
            },
        ));

        let download = json!({"url_base": "http://host/stream/", "title": "clip1", "destination_dir": dest});
        let (code, body) = post(addr, "/v1/download", &download).await?;
        assert_eq!(code, 200);
        assert_eq!(body, json!({"status": 0, "outcome": "success"}));
        assert!(dir.path().join("clip1.flv").is_file());

        let removal = json!({"title": "clip1", "destination_dir": dest});
        let (_, body) = post(addr, "/v1/remove", &removal).await?;
        assert_eq!(body["status"], 0);
        let (_, body) = post(addr, "/v1/remove", &removal).await?;
        assert_eq!(body["status"], 2);

        stop.send(()).ok();
        timeout(WAIT, service).await???;
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_kills_in_flight_client_and_answers_incomplete() -> anyhow::Result<()> {
        use flvd_test_support::fixtures::{SHELL, shell_client_args};

        let dir = tempfile::tempdir()?;
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let config = ServiceConfig {
            fetcher: FetcherKind::Process,
            streamer_bin: SHELL.into(),
            streamer_args: shell_client_args(r#": > "$4"; exec sleep 30"#),
            ..stub_config()
        };
        let (stop, stopped) = oneshot::channel::<()>();
        let service = tokio::spawn(serve(
            listener,
            BootstrapDependencies::from_config(config)?,
            async move {
                stopped.await.ok();
            },
        ));

        let download = json!({
            "url_base": "rtmp://host/live/",
            "title": "long",
            "destination_dir": destination_prefix(dir.path()),
        });
        let call = tokio::spawn(async move { post(addr, "/v1/download", &download).await });
        let output = dir.path().join("long.flv");
        timeout(WAIT, async {
            while !output.exists() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await?;

        stop.send(()).ok();
        let (code, body) = timeout(WAIT, call).await???;
        assert_eq!(code, 200);
        assert_eq!(body, json!({"status": 2, "outcome": "incomplete"}));
        timeout(WAIT, service).await???;
        Ok(())
    }
}
