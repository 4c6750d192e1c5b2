//! Deterministic fixed-point arithmetic
//!
//! All values on the volatility path are integers scaled by [`WAD`]
//! (18 decimals). Logarithms and square roots are computed with integer-only
//! algorithms so a given price history always yields the same bits,
//! independent of platform float behaviour.

use crate::error::OracleError;
use crate::Result;
use ethnum::U256;

/// 1.0 at 18 decimals
pub const WAD: u128 = 1_000_000_000_000_000_000;

const HALF_WAD: u128 = WAD / 2;
const DOUBLE_WAD: u128 = 2 * WAD;

/// log2(e) at 18 decimals
const LOG2_E: u128 = 1_442_695_040_888_963_407;

/// Highest decimal base a price feed may use
pub const MAX_DECIMALS: u8 = 18;

/// 10^decimals
pub fn pow10(decimals: u8) -> Result<u128> {
    10u128
        .checked_pow(u32::from(decimals))
        .ok_or(OracleError::UnsupportedDecimals(decimals))
}

/// `numerator / denominator` at 18 decimals, truncated
///
/// The product `numerator * WAD` is taken at 256 bits, so only a quotient
/// that does not fit in `u128` overflows.
pub fn ratio(numerator: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(OracleError::Overflow("price ratio"));
    }
    let quotient = U256::from(numerator) * U256::from(WAD) / U256::from(denominator);
    match quotient.into_words() {
        (0, low) => Ok(low),
        _ => Err(OracleError::Overflow("price ratio")),
    }
}

/// Natural logarithm of a positive 18-decimal value, at 18 decimals
///
/// `ln(x) = log2(x) / log2(e)`, truncated toward zero.
pub fn ln(x: u128) -> Result<i128> {
    if x == 0 {
        return Err(OracleError::Overflow("logarithm of zero"));
    }

    let log2 = log2(x);
    let magnitude = log2.unsigned_abs() * WAD / LOG2_E;
    let magnitude = i128::try_from(magnitude).map_err(|_| OracleError::Overflow("logarithm"))?;

    Ok(if log2 < 0 { -magnitude } else { magnitude })
}

/// Binary logarithm of a positive 18-decimal value, at 18 decimals
fn log2(x: u128) -> i128 {
    if x >= WAD {
        log2_at_least_one(x) as i128
    } else {
        // log2(x) = -log2(1/x)
        -(log2_at_least_one(WAD * WAD / x) as i128)
    }
}

/// Integer part from the most significant bit, then one fractional bit per
/// squaring of the normalised remainder.
fn log2_at_least_one(x: u128) -> u128 {
    let n = most_significant_bit(x / WAD);
    let mut result = u128::from(n) * WAD;

    // y is in [1, 2)
    let mut y = x >> n;
    if y == WAD {
        return result;
    }

    let mut delta = HALF_WAD;
    while delta > 0 {
        y = y * y / WAD;
        if y >= DOUBLE_WAD {
            result += delta;
            y >>= 1;
        }
        delta >>= 1;
    }

    result
}

fn most_significant_bit(x: u128) -> u32 {
    debug_assert!(x > 0);
    127 - x.leading_zeros()
}

/// Integer square root (floor), Babylonian iteration until the estimate
/// stops decreasing
pub fn sqrt(a: u128) -> u128 {
    if a < 2 {
        return a;
    }

    let mut x = a;
    let mut y = a / 2 + (a & 1);
    while y < x {
        x = y;
        y = (x + a / x) / 2;
    }
    x
}

/// Square root of an 18-decimal value, at 18 decimals
pub fn sqrt_wad(value: u128) -> u128 {
    match value.checked_mul(WAD) {
        Some(scaled) => sqrt(scaled),
        // Past ~3.4e20 the extra digits are dropped: sqrt(v * 1e18) = sqrt(v) * 1e9
        None => sqrt(value) * 1_000_000_000,
    }
}

/// `r * r` at 18 decimals, truncated
pub fn square(r: i128) -> Result<u128> {
    let magnitude = r.unsigned_abs();
    magnitude
        .checked_mul(magnitude)
        .map(|product| product / WAD)
        .ok_or(OracleError::Overflow("square"))
}

/// Convert an 18-decimal value down to `decimals`, truncated
pub fn to_decimals(value: u128, decimals: u8) -> Result<u128> {
    if decimals > MAX_DECIMALS {
        return Err(OracleError::UnsupportedDecimals(decimals));
    }
    Ok(value / pow10(MAX_DECIMALS - decimals)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_ln_golden_values() {
        assert_eq!(ln(WAD).unwrap(), 0);
        assert_eq!(ln(2 * WAD).unwrap(), 693_147_180_559_945_309);
        assert_eq!(ln(WAD / 2).unwrap(), -693_147_180_559_945_309);
        assert_eq!(ln(10 * WAD).unwrap(), 2_302_585_092_994_045_674);
    }

    #[test]
    fn test_ln_price_ratio() {
        let r = ratio(2_100_000_000, 2_000_000_000).unwrap();
        assert_eq!(r, 1_050_000_000_000_000_000);
        assert_eq!(ln(r).unwrap(), 48_790_164_169_431_991);
    }

    #[test]
    fn test_ln_smallest_input() {
        assert_eq!(ln(1).unwrap(), -41_446_531_673_892_822_311);
    }

    #[test]
    fn test_ln_zero_rejected() {
        assert_matches!(ln(0), Err(OracleError::Overflow(_)));
    }

    #[test]
    fn test_log2_fraction() {
        assert_eq!(log2(3 * WAD), 1_584_962_500_721_156_166);
        assert_eq!(log2(8 * WAD), 3 * WAD as i128);
    }

    #[test]
    fn test_ln_is_antisymmetric_for_reciprocals() {
        for x in [3 * WAD, 7 * WAD, 1_250_000_000_000_000_000] {
            let up = ln(x).unwrap();
            let down = ln(WAD * WAD / x).unwrap();
            // Truncating the reciprocal costs at most a few units in the last place
            assert!((up + down).abs() <= 2, "x={} up={} down={}", x, up, down);
        }
    }

    #[test]
    fn test_sqrt_exact_and_floor() {
        assert_eq!(sqrt(0), 0);
        assert_eq!(sqrt(1), 1);
        assert_eq!(sqrt(15), 3);
        assert_eq!(sqrt(16), 4);
        assert_eq!(sqrt(17), 4);
        assert_eq!(sqrt(u128::MAX), u64::MAX as u128);
    }

    #[test]
    fn test_sqrt_wad() {
        assert_eq!(sqrt_wad(2 * WAD), 1_414_213_562_373_095_048);
        assert_eq!(sqrt_wad(4 * WAD), 2 * WAD);
        assert_eq!(sqrt_wad(0), 0);
    }

    #[test]
    fn test_sqrt_wad_large_values_fall_back() {
        let huge = u128::MAX / 2;
        assert_eq!(sqrt_wad(huge), sqrt(huge) * 1_000_000_000);
    }

    #[test]
    fn test_square() {
        assert_eq!(square(2 * WAD as i128).unwrap(), 4 * WAD);
        assert_eq!(square(-(WAD as i128) / 2).unwrap(), WAD / 4);
        assert_matches!(square(i128::MAX), Err(OracleError::Overflow("square")));
    }

    #[test]
    fn test_ratio_of_18_decimal_prices() {
        // numerator * WAD exceeds u128 for any price above ~340 at 18 decimals
        assert_eq!(ratio(3_100 * WAD, 3_000 * WAD).unwrap(), 1_033_333_333_333_333_333);
        assert_eq!(ratio(60_000 * WAD, 60_000 * WAD).unwrap(), WAD);
        assert_eq!(ratio(u128::MAX, u128::MAX).unwrap(), WAD);
        assert_eq!(ratio(u128::MAX / WAD, 1).unwrap(), (u128::MAX / WAD) * WAD);
        assert_matches!(ratio(u128::MAX / WAD + 1, 1), Err(OracleError::Overflow(_)));
    }

    #[test]
    fn test_ratio_and_decimals() {
        assert_eq!(ratio(1, 3).unwrap(), 333_333_333_333_333_333);
        assert_matches!(ratio(u128::MAX, 1), Err(OracleError::Overflow(_)));
        assert_matches!(ratio(1, 0), Err(OracleError::Overflow(_)));

        assert_eq!(to_decimals(24_395_082_084_715_988, 8).unwrap(), 2_439_508);
        assert_eq!(to_decimals(WAD, 18).unwrap(), WAD);
        assert_matches!(to_decimals(WAD, 19), Err(OracleError::UnsupportedDecimals(19)));
        assert_eq!(pow10(0).unwrap(), 1);
    }
}
