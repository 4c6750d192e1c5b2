//! Volatility from a window's running aggregates
//!
//! Nothing here is cached: every read recomputes from `sum` and
//! `sum_squares`, so the result always reflects the latest commit.

use crate::error::OracleError;
use crate::fixed_point::{sqrt, sqrt_wad, to_decimals, WAD};
use crate::window::RollingWindow;
use crate::Result;
use config::VarianceEstimator;

/// 365 days
pub const SECONDS_PER_YEAR: u64 = 365 * 86_400;

/// Precision of the annualization factor
const FACTOR_SCALE: u128 = 1_000_000_000;

/// Variance of the valid log-returns, at 18 decimals
///
/// `(sum_squares - sum^2 / n) / d` with `d = n` (population) or `n - 1`
/// (sample). Zero for fewer than two observations. A numerator that rounds
/// below zero is clamped.
pub fn variance_wad(window: &RollingWindow, estimator: VarianceEstimator) -> Result<u128> {
    let n = window.len() as u128;
    if n <= 1 {
        return Ok(0);
    }

    let sum = window.sum().unsigned_abs();
    let mean_term = sum
        .checked_mul(sum)
        .ok_or(OracleError::Overflow("squared running sum"))?
        / WAD
        / n;
    let numerator = window.sum_squares().saturating_sub(mean_term);

    let divisor = match estimator {
        VarianceEstimator::Population => n,
        VarianceEstimator::Sample => n - 1,
    };
    Ok(numerator / divisor)
}

/// Standard deviation of the valid log-returns, at 18 decimals
pub fn stdev_wad(window: &RollingWindow, estimator: VarianceEstimator) -> Result<u128> {
    Ok(sqrt_wad(variance_wad(window, estimator)?))
}

/// Standard deviation in the feed's decimal base
pub fn vol(window: &RollingWindow, decimals: u8, estimator: VarianceEstimator) -> Result<u128> {
    to_decimals(stdev_wad(window, estimator)?, decimals)
}

/// `sqrt(SECONDS_PER_YEAR / period)` at 9 decimals
pub fn annualization_factor(period: u64) -> Result<u128> {
    if period == 0 {
        return Err(OracleError::Config("period must be positive".to_string()));
    }
    let periods_per_year =
        u128::from(SECONDS_PER_YEAR) * FACTOR_SCALE * FACTOR_SCALE / u128::from(period);
    Ok(sqrt(periods_per_year))
}

/// Scale a per-period volatility to one year
pub fn annualize(vol: u128, period: u64) -> Result<u128> {
    vol.checked_mul(annualization_factor(period)?)
        .map(|scaled| scaled / FACTOR_SCALE)
        .ok_or(OracleError::Overflow("annualized volatility"))
}
