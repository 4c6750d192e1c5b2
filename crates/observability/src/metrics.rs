//! Prometheus metrics infrastructure
//!
//! This module installs the Prometheus exporter and provides the metric set
//! recorded by the oracle keeper.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP server on the specified port that exposes metrics
/// at the `/metrics` endpoint.
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Oracle metrics
///
/// # Metrics
///
/// * `oracle_pools_initialized_total` - Pools created, per pair
/// * `oracle_commits_total` - Successful commits, per pair
/// * `oracle_commit_failures_total` - Rejected commits, per pair and reason
/// * `oracle_volatility` - Latest volatility read, in feed units, per pair
/// * `oracle_observations` - Valid observations in the window, per pair
/// * `oracle_commit_duration_seconds` - Commit latency histogram
///
/// Without an installed recorder every call is a no-op.
#[derive(Clone, Debug)]
pub struct OracleMetrics {
    service: String,
}

impl OracleMetrics {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    pub fn pool_initialized(&self, pair: &str) {
        counter!(
            "oracle_pools_initialized_total",
            "service" => self.service.clone(),
            "pair" => pair.to_string()
        )
        .increment(1);
    }

    /// Record a successful commit and the pool's post-commit state
    pub fn record_commit(&self, pair: &str, observations: u64, volatility: f64) {
        counter!(
            "oracle_commits_total",
            "service" => self.service.clone(),
            "pair" => pair.to_string()
        )
        .increment(1);
        gauge!(
            "oracle_observations",
            "service" => self.service.clone(),
            "pair" => pair.to_string()
        )
        .set(observations as f64);
        gauge!(
            "oracle_volatility",
            "service" => self.service.clone(),
            "pair" => pair.to_string()
        )
        .set(volatility);
    }

    /// Record a rejected commit. `reason` should be a stable snake_case label.
    pub fn record_failure(&self, pair: &str, reason: &'static str) {
        counter!(
            "oracle_commit_failures_total",
            "service" => self.service.clone(),
            "pair" => pair.to_string(),
            "reason" => reason
        )
        .increment(1);
    }

    pub fn record_commit_duration(&self, duration: Duration) {
        histogram!(
            "oracle_commit_duration_seconds",
            "service" => self.service.clone()
        )
        .record(duration.as_secs_f64());
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

/// Records commit latency when dropped
///
/// ```ignore
/// let metrics = OracleMetrics::new("volx");
/// {
///     let _timer = CommitTimer::new(&metrics);
///     oracle.commit(&pair)?;
/// }
/// ```
pub struct CommitTimer<'a> {
    metrics: &'a OracleMetrics,
    start: Instant,
}

impl<'a> CommitTimer<'a> {
    pub fn new(metrics: &'a OracleMetrics) -> Self {
        Self {
            metrics,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for CommitTimer<'_> {
    fn drop(&mut self) {
        self.metrics.record_commit_duration(self.start.elapsed());
    }
}
