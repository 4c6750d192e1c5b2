use crate::*;
use std::collections::HashSet;
use thiserror::Error;

/// Largest feed scale the oracle's 18-decimal arithmetic can absorb
pub const MAX_PRICE_DECIMALS: u8 = 18;

/// Largest rolling window a pool may keep
pub const MAX_WINDOW_SIZE: u64 = 10_000;

/// Longest commit phase for `period`.
///
/// Past half a period the window after a commit made early in a period can
/// open at or before that commit, allowing a second commit in the same period.
pub fn max_commit_phase(period: u64) -> u64 {
    period / 2
}

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("oracle.period_seconds must be a positive integer")]
    InvalidPeriod,

    #[error("oracle.window_size must be a positive integer")]
    InvalidWindowSize,

    #[error("oracle.window_size ({size}) exceeds the maximum of {max}")]
    WindowSizeTooLarge { size: u64, max: u64 },

    #[error("oracle.commit_phase_duration_seconds ({phase}) must be at most half the period ({period})")]
    CommitPhaseTooLong { phase: u64, period: u64 },

    #[error("No asset pairs defined")]
    NoPairs,

    #[error("At least one asset pair must be enabled")]
    NoEnabledPairs,

    #[error("Pair {pair}: {message}")]
    InvalidPair { pair: String, message: String },

    #[error("Pair {0} is defined more than once")]
    DuplicatePair(String),

    #[error("Static price for {pair}: {message}")]
    InvalidStaticPrice { pair: String, message: String },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Invalid metrics port: {0}")]
    InvalidMetricsPort(u16),

    #[error("Environment variable placeholder left unresolved in {field}: {value}")]
    UnresolvedEnvVar { field: String, value: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_oracle(&config.oracle, &mut report);
    validate_pairs(&config.pairs, &mut report);
    validate_price_source(config, &mut report);

    match &config.keeper {
        Some(keeper) => validate_keeper(keeper, &config.oracle, &mut report),
        None => report.add_default("keeper", "enabled, poll every 60s, initialize pools"),
    }

    match &config.logging {
        Some(logging) => validate_logging(logging, &mut report),
        None => report.add_default("logging", "pretty, info"),
    }

    match &config.metrics {
        Some(metrics) => validate_metrics(metrics, &mut report),
        None => report.add_default("metrics", "disabled"),
    }

    report
}

fn validate_oracle(oracle: &OracleSettings, report: &mut ValidationReport) {
    if oracle.period_seconds == 0 {
        report.add_error(ValidationError::InvalidPeriod);
    }

    if oracle.window_size == 0 {
        report.add_error(ValidationError::InvalidWindowSize);
    } else if oracle.window_size > MAX_WINDOW_SIZE {
        report.add_error(ValidationError::WindowSizeTooLarge {
            size: oracle.window_size,
            max: MAX_WINDOW_SIZE,
        });
    } else if oracle.window_size == 1 {
        report.add_warning(
            "oracle.window_size",
            "A window of one observation always reports zero volatility",
        );
    }

    if oracle.period_seconds > 0
        && oracle.commit_phase_duration_seconds > max_commit_phase(oracle.period_seconds)
    {
        report.add_error(ValidationError::CommitPhaseTooLong {
            phase: oracle.commit_phase_duration_seconds,
            period: oracle.period_seconds,
        });
    }

    if oracle.commit_phase_duration_seconds == 0 {
        report.add_warning(
            "oracle.commit_phase_duration_seconds",
            "Commits are only accepted at or after the top of each period",
        );
    }

    if oracle.estimator == VarianceEstimator::Sample {
        report.add_warning(
            "oracle.estimator",
            "Sample estimator divides by n - 1 and will not match population-based consumers",
        );
    }
}

fn validate_pairs(pairs: &[PairConfig], report: &mut ValidationReport) {
    if pairs.is_empty() {
        report.add_error(ValidationError::NoPairs);
        return;
    }

    let mut seen = HashSet::new();
    let mut enabled_count = 0;

    for pair in pairs {
        let label = pair.label();

        if pair.underlying.trim().is_empty() || pair.quote.trim().is_empty() {
            report.add_error(ValidationError::InvalidPair {
                pair: label.clone(),
                message: "underlying and quote are required".to_string(),
            });
        } else if pair.underlying.trim().eq_ignore_ascii_case(pair.quote.trim()) {
            report.add_error(ValidationError::InvalidPair {
                pair: label.clone(),
                message: "underlying and quote must differ".to_string(),
            });
        }

        if has_unresolved_env_vars(&pair.underlying) || has_unresolved_env_vars(&pair.quote) {
            report.add_error(ValidationError::UnresolvedEnvVar {
                field: "pairs".to_string(),
                value: label.clone(),
            });
        }

        if !seen.insert(label.clone()) {
            report.add_error(ValidationError::DuplicatePair(label));
        }

        if pair.enabled {
            enabled_count += 1;
        }
    }

    if enabled_count == 0 {
        report.add_error(ValidationError::NoEnabledPairs);
    }
}

fn validate_price_source(config: &MasterConfig, report: &mut ValidationReport) {
    let mut priced = HashSet::new();

    for entry in &config.price_source.static_prices {
        let label = match entry.pair.parse::<common::AssetPair>() {
            Ok(pair) => pair.label(),
            Err(e) => {
                report.add_error(ValidationError::InvalidStaticPrice {
                    pair: entry.pair.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        if entry.value == 0 {
            report.add_error(ValidationError::InvalidStaticPrice {
                pair: label.clone(),
                message: "value must be positive".to_string(),
            });
        }

        if entry.decimals > MAX_PRICE_DECIMALS {
            report.add_error(ValidationError::InvalidStaticPrice {
                pair: label.clone(),
                message: format!("decimals must be at most {}", MAX_PRICE_DECIMALS),
            });
        }

        priced.insert(label);
    }

    for pair in config.enabled_pairs() {
        let label = pair.label();
        if !priced.contains(&label) {
            report.add_warning(
                "price_source.static_prices",
                &format!("No seed price for {}; commits will fail until one is set", label),
            );
        }
    }
}

fn validate_keeper(keeper: &KeeperConfig, oracle: &OracleSettings, report: &mut ValidationReport) {
    if keeper.poll_interval_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "keeper.poll_interval_seconds".to_string(),
        });
        return;
    }

    if oracle.commit_phase_duration_seconds > 0
        && keeper.poll_interval_seconds > oracle.commit_phase_duration_seconds
    {
        report.add_warning(
            "keeper.poll_interval_seconds",
            "Poll interval is longer than the commit phase; commits may land late in the period",
        );
    }

    if !keeper.enabled {
        report.add_warning("keeper.enabled", "Keeper disabled; pools will only advance on manual commits");
    }
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    let valid_formats = ["pretty", "json", "compact"];
    if !valid_formats.contains(&logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(logging.format.clone()));
    }

    if logging.level.trim().is_empty() {
        report.add_default("logging.level", "info");
    }
}

fn validate_metrics(metrics: &MetricsConfig, report: &mut ValidationReport) {
    if metrics.enabled && metrics.port == 0 {
        report.add_error(ValidationError::InvalidMetricsPort(metrics.port));
    }
}
