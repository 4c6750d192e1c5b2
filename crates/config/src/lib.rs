//! Configuration model for the volatility oracle
//!
//! The configuration is a single YAML document. Only the `oracle` section is
//! required; every other section falls back to defaults.
//!
//! ```yaml
//! oracle:
//!   period_seconds: 86400
//!   window_size: 90
//!   commit_phase_duration_seconds: 3600
//! pairs:
//!   - underlying: WBTC
//!     quote: USDC
//! ```

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MasterConfig {
    pub oracle: OracleSettings,
    #[serde(default)]
    pub pairs: Vec<PairConfig>,
    #[serde(rename = "price_source")]
    #[serde(default)]
    pub price_source: PriceSourceConfig,
    #[serde(default)]
    pub keeper: Option<KeeperConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

impl MasterConfig {
    /// Keeper settings, falling back to defaults when the section is absent
    pub fn keeper(&self) -> KeeperConfig {
        self.keeper.clone().unwrap_or_default()
    }

    /// Logging settings, falling back to defaults when the section is absent
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Metrics settings, falling back to defaults when the section is absent
    pub fn metrics(&self) -> MetricsConfig {
        self.metrics.clone().unwrap_or_default()
    }

    /// Enabled pairs in declaration order
    pub fn enabled_pairs(&self) -> impl Iterator<Item = &PairConfig> {
        self.pairs.iter().filter(|p| p.enabled)
    }
}

/// Deployment-time oracle parameters. Immutable once the oracle is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleSettings {
    /// Seconds per observation period
    #[serde(rename = "period_seconds")]
    #[serde(default = "default_period_seconds")]
    pub period_seconds: u64,
    /// Number of log-returns kept in the rolling window
    #[serde(rename = "window_size")]
    #[serde(default = "default_window_size")]
    pub window_size: u64,
    /// Seconds before the top of period during which a commit is accepted
    #[serde(rename = "commit_phase_duration_seconds")]
    #[serde(default = "default_commit_phase_duration_seconds")]
    pub commit_phase_duration_seconds: u64,
    #[serde(default)]
    pub estimator: VarianceEstimator,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            period_seconds: default_period_seconds(),
            window_size: default_window_size(),
            commit_phase_duration_seconds: default_commit_phase_duration_seconds(),
            estimator: VarianceEstimator::default(),
        }
    }
}

/// Divisor used when turning the window's aggregates into a variance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceEstimator {
    /// Divide by `n`
    #[default]
    Population,
    /// Divide by `n - 1`
    Sample,
}

impl std::fmt::Display for VarianceEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarianceEstimator::Population => write!(f, "population"),
            VarianceEstimator::Sample => write!(f, "sample"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PairConfig {
    pub underlying: String,
    pub quote: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl PairConfig {
    /// "UNDERLYING/QUOTE" label, as used by static price entries
    pub fn label(&self) -> String {
        format!(
            "{}/{}",
            self.underlying.trim().to_uppercase(),
            self.quote.trim().to_uppercase()
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PriceSourceConfig {
    #[serde(rename = "type")]
    #[serde(default)]
    pub source_type: PriceSourceType,
    /// Seed prices for the static source
    #[serde(rename = "static_prices")]
    #[serde(default)]
    pub static_prices: Vec<StaticPriceConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSourceType {
    /// In-memory prices seeded from this file
    #[default]
    Static,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticPriceConfig {
    /// Pair in "UNDERLYING/QUOTE" form
    pub pair: String,
    /// Raw feed value, scaled by `10^decimals`
    pub value: u64,
    #[serde(default = "default_price_decimals")]
    pub decimals: u8,
}

/// Background committer settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeeperConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(rename = "poll_interval_seconds")]
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    /// Initialize every enabled pair's pool on startup
    #[serde(rename = "initialize_pools")]
    #[serde(default = "default_enabled")]
    pub initialize_pools: bool,
    #[serde(rename = "run_on_startup")]
    #[serde(default = "default_enabled")]
    pub run_on_startup: bool,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_seconds: default_poll_interval_seconds(),
            initialize_pools: true,
            run_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Fallback filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}
