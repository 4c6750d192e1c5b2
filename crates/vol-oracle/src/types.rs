//! Core oracle types

use crate::error::OracleError;
use crate::fixed_point::MAX_DECIMALS;
use crate::Result;
use common::AssetPair;
use config::{max_commit_phase, OracleSettings, VarianceEstimator, MAX_WINDOW_SIZE};
use serde::{Deserialize, Serialize};

/// Spot price as reported by a feed: `value / 10^decimals`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub value: i128,
    pub decimals: u8,
}

impl PriceQuote {
    pub fn new(value: i128, decimals: u8) -> Self {
        Self { value, decimals }
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0
    }
}

/// Deployment-wide pool parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Seconds per observation period
    pub period: u64,
    /// Log-returns kept per pool
    pub window_size: u64,
    /// Seconds before the top of period during which commits are accepted
    pub commit_phase_duration: u64,
    pub estimator: VarianceEstimator,
}

impl PoolConfig {
    pub fn new(period: u64, window_size: u64, commit_phase_duration: u64) -> Result<Self> {
        Self::with_estimator(
            period,
            window_size,
            commit_phase_duration,
            VarianceEstimator::default(),
        )
    }

    pub fn with_estimator(
        period: u64,
        window_size: u64,
        commit_phase_duration: u64,
        estimator: VarianceEstimator,
    ) -> Result<Self> {
        if period == 0 {
            return Err(OracleError::Config("period must be positive".to_string()));
        }
        if window_size == 0 {
            return Err(OracleError::Config("window size must be positive".to_string()));
        }
        // The window is allocated up front
        if window_size > MAX_WINDOW_SIZE {
            return Err(OracleError::Config(format!(
                "window size {} exceeds the maximum of {}",
                window_size, MAX_WINDOW_SIZE
            )));
        }
        // Keeps the next window opening strictly after any commit
        if commit_phase_duration > max_commit_phase(period) {
            return Err(OracleError::Config(format!(
                "commit phase ({}s) longer than half the period ({}s)",
                commit_phase_duration, period
            )));
        }

        Ok(Self {
            period,
            window_size,
            commit_phase_duration,
            estimator,
        })
    }

    pub fn from_settings(settings: &OracleSettings) -> Result<Self> {
        Self::with_estimator(
            settings.period_seconds,
            settings.window_size,
            settings.commit_phase_duration_seconds,
            settings.estimator,
        )
    }

    pub(crate) fn window_capacity(&self) -> usize {
        // Bounded by MAX_WINDOW_SIZE in the constructor
        self.window_size as usize
    }
}

/// Outcome of a successful commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub pair: AssetPair,
    pub price: PriceQuote,
    /// ln(p_t / p_{t-1}) at 18 decimals; zero for the first commit
    pub log_return: i128,
    /// Commits recorded so far, including this one
    pub observation_count: u64,
    /// Volatility after the commit, in the feed's decimals
    pub vol: u128,
    pub committed_at: u64,
}

/// Read-only view of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub pair: AssetPair,
    pub initialized: bool,
    pub last_price: Option<PriceQuote>,
    pub last_commit_timestamp: u64,
    pub observation_count: u64,
    pub window_size: u64,
    pub running_sum: i128,
    pub running_sum_squares: u128,
    /// Valid log-returns, oldest first
    pub observations: Vec<i128>,
}

impl PoolSnapshot {
    /// Observations currently contributing to the volatility
    pub fn valid_observations(&self) -> u64 {
        self.observation_count.min(self.window_size)
    }
}

pub(crate) fn check_decimals(decimals: u8) -> Result<()> {
    if decimals > MAX_DECIMALS {
        return Err(OracleError::UnsupportedDecimals(decimals));
    }
    Ok(())
}
