//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Labels are bounded: downloads by outcome label, removals by outcome label.

use std::sync::Arc;
use std::time::Duration;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    downloads_total: IntCounterVec,
    removals_total: IntCounterVec,
    active_downloads: IntGauge,
    waiting_downloads: IntGauge,
    last_download_duration_ms: IntGauge,
    same_path_rejections_total: IntCounter,
    guardrail_violations_total: IntCounter,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Client runs currently in flight.
    pub active_downloads: i64,
    /// Downloads queued behind a same-path lock or the concurrency cap.
    pub waiting_downloads: i64,
    /// Wall-clock duration of the most recently finished client run.
    pub last_download_duration_ms: i64,
    /// Downloads refused under the `reject` same-path policy.
    pub same_path_rejections_total: u64,
    /// Startup guardrail violations recorded.
    pub guardrail_violations_total: u64,
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn counter(name: &'static str, help: &str) -> Result<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let downloads_total = counter_vec(
            "downloads_total",
            "Finished downloads by client outcome",
            &["outcome"],
        )?;
        let removals_total = counter_vec(
            "removals_total",
            "Finished removals by outcome",
            &["outcome"],
        )?;
        let active_downloads = gauge("active_downloads", "Streaming client runs in flight")?;
        let waiting_downloads = gauge(
            "waiting_downloads",
            "Downloads waiting on a same-path lock or the concurrency cap",
        )?;
        let last_download_duration_ms = gauge(
            "last_download_duration_ms",
            "Duration of the most recent streaming client run (ms)",
        )?;
        let same_path_rejections_total = counter(
            "same_path_rejections_total",
            "Downloads refused because the output path was busy",
        )?;
        let guardrail_violations_total = counter(
            "config_guardrail_violations_total",
            "Configuration and startup guardrail violations",
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "downloads_total", &downloads_total)?;
        register(&registry, "removals_total", &removals_total)?;
        register(&registry, "active_downloads", &active_downloads)?;
        register(&registry, "waiting_downloads", &waiting_downloads)?;
        register(
            &registry,
            "last_download_duration_ms",
            &last_download_duration_ms,
        )?;
        register(
            &registry,
            "same_path_rejections_total",
            &same_path_rejections_total,
        )?;
        register(
            &registry,
            "config_guardrail_violations_total",
            &guardrail_violations_total,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                downloads_total,
                removals_total,
                active_downloads,
                waiting_downloads,
                last_download_duration_ms,
                same_path_rejections_total,
                guardrail_violations_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Record a finished download and its duration.
    pub fn observe_download(&self, outcome: &str, duration: Duration) {
        self.inner
            .downloads_total
            .with_label_values(&[outcome])
            .inc();
        self.inner
            .last_download_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Record a finished removal.
    pub fn inc_removal(&self, outcome: &str) {
        self.inner.removals_total.with_label_values(&[outcome]).inc();
    }

    /// Adjust the in-flight client run gauge.
    pub fn add_active_downloads(&self, delta: i64) {
        self.inner.active_downloads.add(delta);
    }

    /// Adjust the waiting download gauge.
    pub fn add_waiting_downloads(&self, delta: i64) {
        self.inner.waiting_downloads.add(delta);
    }

    /// Increment the same-path rejection counter.
    pub fn inc_same_path_rejection(&self) {
        self.inner.same_path_rejections_total.inc();
    }

    /// Increment the guardrail violation counter (e.g. loopback enforcement).
    pub fn inc_guardrail_violation(&self) {
        self.inner.guardrail_violations_total.inc();
    }

    /// Count of finished downloads for one outcome label.
    #[must_use]
    pub fn downloads_with_outcome(&self, outcome: &str) -> u64 {
        self.inner
            .downloads_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Count of finished removals for one outcome label.
    #[must_use]
    pub fn removals_with_outcome(&self, outcome: &str) -> u64 {
        self.inner.removals_total.with_label_values(&[outcome]).get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_downloads: self.inner.active_downloads.get(),
            waiting_downloads: self.inner.waiting_downloads.get(),
            last_download_duration_ms: self.inner.last_download_duration_ms.get(),
            same_path_rejections_total: self.inner.same_path_rejections_total.get(),
            guardrail_violations_total: self.inner.guardrail_violations_total.get(),
        }
    }

    fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_render_includes_recorded_series() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/v1/download", 200);
        metrics.observe_download("success", Duration::from_millis(1500));
        metrics.observe_download("client_error", Duration::from_millis(20));
        metrics.inc_removal("not_found");
        metrics.add_active_downloads(1);
        metrics.inc_guardrail_violation();

        let rendered = metrics.render()?;
        assert!(rendered.contains(r#"route="/v1/download""#));
        assert!(rendered.contains(r#"code="200""#));
        assert!(rendered.contains(r#"downloads_total{outcome="success"} 1"#));
        assert!(rendered.contains(r#"removals_total{outcome="not_found"} 1"#));
        assert!(rendered.contains("active_downloads 1"));
        assert_eq!(metrics.downloads_with_outcome("client_error"), 1);
        assert_eq!(metrics.removals_with_outcome("removed"), 0);
        Ok(())
    }

    #[test]
    fn snapshot_reflects_gauges_and_counters() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let metrics = Metrics::new()?;
        metrics.add_active_downloads(2);
        metrics.add_active_downloads(-1);
        metrics.add_waiting_downloads(3);
        metrics.inc_same_path_rejection();
        metrics.observe_download("failed", Duration::from_millis(42));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_downloads, 1);
        assert_eq!(snapshot.waiting_downloads, 3);
        assert_eq!(snapshot.last_download_duration_ms, 42);
        assert_eq!(snapshot.same_path_rejections_total, 1);
        assert_eq!(snapshot.guardrail_violations_total, 0);

        let value = serde_json::to_value(&snapshot)?;
        assert_eq!(value["active_downloads"], 1);
        Ok(())
    }

    #[test]
    fn clones_share_one_registry() -> Result<()> {
        let metrics = Metrics::new()?;
        let clone = metrics.clone();
        clone.inc_removal("removed");
        assert_eq!(metrics.removals_with_outcome("removed"), 1);
        Ok(())
    }
}
