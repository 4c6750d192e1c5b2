//! Background worker that commits prices on schedule.
//!
//! The `CommitKeeper` polls every configured pair and commits those whose
//! commit window is open. Failures are logged and counted; the next poll
//! simply tries again.

use crate::client::OracleClient;
use crate::error::OracleError;
use crate::types::CommitReceipt;
use common::AssetPair;
use config::KeeperConfig;
use observability::{CommitTimer, OracleMetrics};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of one keeper cycle
#[derive(Debug, Default)]
pub struct KeeperReport {
    pub committed: Vec<CommitReceipt>,
    /// Pairs whose window was still closed
    pub skipped: Vec<AssetPair>,
    pub failed: Vec<(AssetPair, OracleError)>,
}

impl KeeperReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub struct CommitKeeper {
    client: OracleClient,
    pairs: Vec<AssetPair>,
    config: KeeperConfig,
    metrics: OracleMetrics,
}

impl CommitKeeper {
    pub fn new(
        client: OracleClient,
        pairs: Vec<AssetPair>,
        config: KeeperConfig,
        metrics: OracleMetrics,
    ) -> Self {
        Self {
            client,
            pairs,
            config,
            metrics,
        }
    }

    pub fn pairs(&self) -> &[AssetPair] {
        &self.pairs
    }

    /// Create pools for configured pairs that have none yet.
    /// Returns how many were created.
    pub async fn initialize_pools(&self) -> usize {
        let mut created = 0;
        for pair in &self.pairs {
            if self.client.is_initialized(pair).await {
                debug!(pair = %pair, "Pool already exists");
                continue;
            }
            match self.client.init_pool(pair).await {
                Ok(()) => {
                    self.metrics.pool_initialized(&pair.label());
                    created += 1;
                }
                Err(e) => error!(pair = %pair, "Failed to initialize pool: {}", e),
            }
        }
        created
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Starting CommitKeeper for {} pairs (interval={}s, run_on_startup={})",
            self.pairs.len(),
            self.config.poll_interval_seconds,
            self.config.run_on_startup
        );

        if self.config.initialize_pools {
            let created = self.initialize_pools().await;
            info!("Initialized {} pools", created);
        }

        if self.config.run_on_startup {
            self.run_cycle().await;
        }

        let interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));
        let mut timer = tokio::time::interval(interval);
        timer.tick().await; // first tick is immediate

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.cancelled() => {
                    info!("CommitKeeper shutting down.");
                    return;
                }
            }
        }
    }

    /// Visit every pair once
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> KeeperReport {
        let mut report = KeeperReport::default();

        for pair in &self.pairs {
            let label = pair.label();

            match self.client.is_commit_window_open(pair).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(pair = %pair, "Commit window closed");
                    report.skipped.push(pair.clone());
                    continue;
                }
                Err(e) => {
                    self.metrics.record_failure(&label, e.kind());
                    error!(pair = %pair, "Cannot check commit window: {}", e);
                    report.failed.push((pair.clone(), e));
                    continue;
                }
            }

            let result = {
                let _timer = CommitTimer::new(&self.metrics);
                self.client.commit(pair).await
            };

            match result {
                Ok(receipt) => {
                    let observations = self
                        .client
                        .snapshot(pair)
                        .await
                        .map(|s| s.valid_observations())
                        .unwrap_or(receipt.observation_count);
                    let vol = receipt.vol as f64 / 10f64.powi(i32::from(receipt.price.decimals));
                    self.metrics.record_commit(&label, observations, vol);
                    report.committed.push(receipt);
                }
                // Another writer committed between the check and the commit
                Err(e) if e.is_timing() => {
                    debug!(pair = %pair, "{}", e);
                    report.skipped.push(pair.clone());
                }
                Err(e) => {
                    self.metrics.record_failure(&label, e.kind());
                    warn!(pair = %pair, "Commit failed: {}", e);
                    report.failed.push((pair.clone(), e));
                }
            }
        }

        info!(
            committed = report.committed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Keeper cycle complete"
        );
        report
    }
}
