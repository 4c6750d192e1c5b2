//! Oracle error types

use common::AssetPair;
use thiserror::Error;

/// Errors that can occur during oracle operations
///
/// Every error is raised before pool state is touched, so a failed call
/// leaves the pool exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// `init_pool` on a pair that already has a pool
    #[error("Pool already initialized: {0}")]
    AlreadyInitialized(AssetPair),

    /// Commit or read on a pair that was never initialized
    #[error("Pool not initialized: {0}")]
    NotInitialized(AssetPair),

    /// Commit attempted before the pool's commit window opened
    #[error("Commit too early for {pair}: window opens at {opens_at}, now {now}")]
    TooEarly { pair: AssetPair, now: u64, opens_at: u64 },

    /// The price source could not supply a price
    #[error("Price unavailable for {pair}: {reason}")]
    PriceUnavailable { pair: AssetPair, reason: String },

    /// The price source returned a non-positive price
    #[error("Invalid price for {pair}: {value}")]
    InvalidPrice { pair: AssetPair, value: i128 },

    /// The feed changed its decimal base after the pool pinned it
    #[error("Decimals mismatch for {pair}: pool uses {expected}, feed returned {actual}")]
    DecimalsMismatch { pair: AssetPair, expected: u8, actual: u8 },

    /// Feed scale beyond what 18-decimal arithmetic supports
    #[error("Unsupported price decimals: {0}")]
    UnsupportedDecimals(u8),

    /// Fixed-point overflow
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Invalid pool configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OracleError {
    /// Stable snake_case label, used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::AlreadyInitialized(_) => "already_initialized",
            OracleError::NotInitialized(_) => "not_initialized",
            OracleError::TooEarly { .. } => "too_early",
            OracleError::PriceUnavailable { .. } => "price_unavailable",
            OracleError::InvalidPrice { .. } => "invalid_price",
            OracleError::DecimalsMismatch { .. } => "decimals_mismatch",
            OracleError::UnsupportedDecimals(_) => "unsupported_decimals",
            OracleError::Overflow(_) => "overflow",
            OracleError::Config(_) => "config",
        }
    }

    /// Timing errors clear up on their own once the window opens
    pub fn is_timing(&self) -> bool {
        matches!(self, OracleError::TooEarly { .. })
    }
}
