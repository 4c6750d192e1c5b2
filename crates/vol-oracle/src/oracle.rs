//! Synchronous oracle core
//!
//! `VolatilityOracle` owns the pool registry and drives the commit flow:
//! cadence check, price fetch, log-return, window update. Mutation goes
//! through `&mut self`, so a commit is never observed half-applied.

use crate::calculator;
use crate::clock::Clock;
use crate::error::OracleError;
use crate::fixed_point::{ln, ratio};
use crate::price_source::PriceSource;
use crate::registry::{Pool, PoolRegistry};
use crate::scheduler::PeriodScheduler;
use crate::types::{check_decimals, CommitReceipt, PoolConfig, PoolSnapshot, PriceQuote};
use crate::Result;
use common::AssetPair;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct VolatilityOracle {
    config: PoolConfig,
    scheduler: PeriodScheduler,
    registry: PoolRegistry,
    price_source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
}

impl VolatilityOracle {
    pub fn new(config: PoolConfig, price_source: Arc<dyn PriceSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            scheduler: PeriodScheduler::new(config.period, config.commit_phase_duration),
            registry: PoolRegistry::new(config.window_capacity()),
            config,
            price_source,
            clock,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &PeriodScheduler {
        &self.scheduler
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Create an empty pool for `pair`
    pub fn init_pool(&mut self, pair: &AssetPair) -> Result<()> {
        self.registry.init_pool(pair)?;
        info!(
            pair = %pair,
            window_size = self.config.window_size,
            period = self.config.period,
            "Pool initialized"
        );
        Ok(())
    }

    /// Record the latest spot price for `pair`
    ///
    /// Rejected before the pool's commit window opens. All checks and the
    /// new window are computed before the pool is written, so an error
    /// leaves it unchanged.
    #[instrument(skip(self, pair), fields(pair = %pair))]
    pub fn commit(&mut self, pair: &AssetPair) -> Result<CommitReceipt> {
        let now = self.clock.now();
        let pool = self.registry.get_pool(pair)?;
        self.scheduler
            .check_commit(pair, pool.last_commit_timestamp(), now)?;

        let quote = self.price_source.latest_price(pair)?;
        debug!(value = quote.value, decimals = quote.decimals, "Fetched spot price");
        Self::check_quote(pair, pool, &quote)?;

        let log_return = match pool.last_price() {
            Some(previous) => ln(ratio(quote.value.unsigned_abs(), previous.value.unsigned_abs())?)?,
            None => 0,
        };

        let mut window = pool.window().clone();
        window.push(log_return)?;
        let vol = calculator::vol(&window, quote.decimals, self.config.estimator)?;
        let observation_count = window.count();

        let pool = self.registry.get_pool_mut(pair)?;
        pool.window = window;
        pool.last_price = Some(quote);
        pool.last_commit_timestamp = now;

        info!(
            log_return,
            observation_count,
            vol,
            committed_at = now,
            "Price committed"
        );

        Ok(CommitReceipt {
            pair: pair.clone(),
            price: quote,
            log_return,
            observation_count,
            vol,
            committed_at: now,
        })
    }

    fn check_quote(pair: &AssetPair, pool: &Pool, quote: &PriceQuote) -> Result<()> {
        if !quote.is_positive() {
            return Err(OracleError::InvalidPrice {
                pair: pair.clone(),
                value: quote.value,
            });
        }
        check_decimals(quote.decimals)?;
        match pool.decimals() {
            Some(expected) if expected != quote.decimals => Err(OracleError::DecimalsMismatch {
                pair: pair.clone(),
                expected,
                actual: quote.decimals,
            }),
            _ => Ok(()),
        }
    }

    /// Standard deviation of the pool's log-returns in the feed's decimals
    ///
    /// Zero until the pool has two observations.
    pub fn vol(&self, pair: &AssetPair) -> Result<u128> {
        let pool = self.registry.get_pool(pair)?;
        match pool.decimals() {
            Some(decimals) => calculator::vol(pool.window(), decimals, self.config.estimator),
            None => Ok(0),
        }
    }

    /// `vol` scaled from one period to one year
    pub fn annualized_vol(&self, pair: &AssetPair) -> Result<u128> {
        calculator::annualize(self.vol(pair)?, self.config.period)
    }

    pub fn snapshot(&self, pair: &AssetPair) -> Result<PoolSnapshot> {
        Ok(self.registry.get_pool(pair)?.snapshot(pair))
    }

    /// Valid log-returns, oldest first
    pub fn observations(&self, pair: &AssetPair) -> Result<Vec<i128>> {
        Ok(self.registry.get_pool(pair)?.window().observations())
    }

    /// Check the running aggregates against a full recomputation
    pub fn verify_aggregates(&self, pair: &AssetPair) -> Result<bool> {
        Ok(self.registry.get_pool(pair)?.window().sums_consistent())
    }

    pub fn commit_window_opens_at(&self, pair: &AssetPair) -> Result<u64> {
        let pool = self.registry.get_pool(pair)?;
        Ok(self
            .scheduler
            .commit_window_opens_at(pool.last_commit_timestamp()))
    }

    pub fn is_commit_window_open(&self, pair: &AssetPair) -> Result<bool> {
        let pool = self.registry.get_pool(pair)?;
        Ok(self
            .scheduler
            .is_commit_window_open(pool.last_commit_timestamp(), self.clock.now()))
    }

    pub fn is_initialized(&self, pair: &AssetPair) -> bool {
        self.registry.contains(pair)
    }

    /// Registered pairs, sorted
    pub fn pairs(&self) -> Vec<AssetPair> {
        self.registry.pairs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fixed_point::WAD;
    use crate::price_source::StaticPriceSource;
    use crate::scheduler::top_of_period;
    use assert_matches::assert_matches;
    use config::VarianceEstimator;

    const DAY: u64 = 86_400;
    const HOUR: u64 = 3_600;

    struct Harness {
        oracle: VolatilityOracle,
        prices: Arc<StaticPriceSource>,
        clock: Arc<ManualClock>,
        pair: AssetPair,
    }

    impl Harness {
        fn new(window_size: u64) -> Self {
            Self::with_config(PoolConfig::new(DAY, window_size, HOUR).unwrap())
        }

        fn with_config(config: PoolConfig) -> Self {
            let prices = Arc::new(StaticPriceSource::default());
            let clock = Arc::new(ManualClock::new(100 * DAY));
            let pair = AssetPair::new("WBTC", "USDC");
            let mut oracle = VolatilityOracle::new(config, prices.clone(), clock.clone());
            oracle.init_pool(&pair).unwrap();
            Self {
                oracle,
                prices,
                clock,
                pair,
            }
        }

        fn set_price(&self, value: i128) {
            self.set_quote(value, 8);
        }

        fn set_quote(&self, value: i128, decimals: u8) {
            self.prices
                .set_latest_price(&self.pair, PriceQuote::new(value, decimals));
        }

        /// Commit `value`, then move the clock to the next top of period
        fn commit_at_price(&mut self, value: i128) -> Result<CommitReceipt> {
            self.set_price(value);
            let receipt = self.oracle.commit(&self.pair)?;
            self.clock
                .set(top_of_period(receipt.committed_at, self.oracle.config().period));
            Ok(receipt)
        }
    }

    #[test]
    fn test_reference_price_series() {
        let mut h = Harness::new(90);
        let prices = [2_000_000_000, 2_100_000_000, 2_200_000_000, 2_150_000_000];
        let expected = [0, 2_439_508, 2_248_393, 3_068_199];

        for (i, (&price, &vol)) in prices.iter().zip(expected.iter()).enumerate() {
            let receipt = h.commit_at_price(price).unwrap();
            assert_eq!(receipt.vol, vol);
            assert_eq!(receipt.observation_count, i as u64 + 1);
            assert_eq!(h.oracle.vol(&h.pair).unwrap(), vol);
            assert!(h.oracle.verify_aggregates(&h.pair).unwrap());
        }

        assert_eq!(
            h.oracle.observations(&h.pair).unwrap(),
            vec![
                0,
                48_790_164_169_431_991,
                46_520_015_634_892_848,
                -22_989_518_224_698_728
            ]
        );
    }

    #[test]
    fn test_first_commit_records_zero_return() {
        let mut h = Harness::new(90);
        let receipt = h.commit_at_price(2_000_000_000).unwrap();

        assert_eq!(receipt.log_return, 0);
        assert_eq!(receipt.vol, 0);
        assert_eq!(receipt.committed_at, 100 * DAY);

        let snapshot = h.oracle.snapshot(&h.pair).unwrap();
        assert_eq!(snapshot.observations, vec![0]);
        assert_eq!(snapshot.last_price, Some(PriceQuote::new(2_000_000_000, 8)));
        assert_eq!(snapshot.last_commit_timestamp, 100 * DAY);
    }

    #[test]
    fn test_vol_before_any_commit_is_zero() {
        let h = Harness::new(90);
        assert_eq!(h.oracle.vol(&h.pair).unwrap(), 0);
        assert_eq!(h.oracle.annualized_vol(&h.pair).unwrap(), 0);
    }

    #[test]
    fn test_init_pool_twice() {
        let mut h = Harness::new(90);
        h.commit_at_price(2_000_000_000).unwrap();
        let before = h.oracle.snapshot(&h.pair).unwrap();

        assert_matches!(
            h.oracle.init_pool(&h.pair),
            Err(OracleError::AlreadyInitialized(_))
        );
        assert_eq!(h.oracle.snapshot(&h.pair).unwrap(), before);
    }

    #[test]
    fn test_uninitialized_pair() {
        let mut h = Harness::new(90);
        let pair = AssetPair::new("WETH", "USDC");

        assert_matches!(h.oracle.commit(&pair), Err(OracleError::NotInitialized(_)));
        assert_matches!(h.oracle.vol(&pair), Err(OracleError::NotInitialized(_)));
        assert_matches!(h.oracle.snapshot(&pair), Err(OracleError::NotInitialized(_)));
        assert!(!h.oracle.is_initialized(&pair));
    }

    #[test]
    fn test_cadence_enforced() {
        let mut h = Harness::new(90);
        h.set_price(2_000_000_000);
        h.oracle.commit(&h.pair).unwrap();

        // Same period
        h.clock.advance(1);
        assert_matches!(
            h.oracle.commit(&h.pair),
            Err(OracleError::TooEarly { opens_at, .. }) if opens_at == 101 * DAY - HOUR
        );
        assert!(!h.oracle.is_commit_window_open(&h.pair).unwrap());

        h.clock.set(101 * DAY - HOUR - 1);
        assert!(h.oracle.commit(&h.pair).is_err());

        // Commit phase open
        h.clock.set(101 * DAY - HOUR);
        assert!(h.oracle.is_commit_window_open(&h.pair).unwrap());
        h.set_price(2_100_000_000);
        let receipt = h.oracle.commit(&h.pair).unwrap();
        assert_eq!(receipt.observation_count, 2);
        assert_eq!(
            h.oracle.commit_window_opens_at(&h.pair).unwrap(),
            top_of_period(101 * DAY - HOUR, DAY) - HOUR
        );
    }

    #[test]
    fn test_failed_commits_leave_pool_unchanged() {
        let mut h = Harness::new(90);
        h.commit_at_price(2_000_000_000).unwrap();
        h.commit_at_price(2_100_000_000).unwrap();

        let before = h.oracle.snapshot(&h.pair).unwrap();
        let before_json = serde_json::to_string(&before).unwrap();
        let assert_unchanged = |oracle: &VolatilityOracle, pair: &AssetPair| {
            let after = oracle.snapshot(pair).unwrap();
            assert_eq!(after, before);
            assert_eq!(serde_json::to_string(&after).unwrap(), before_json);
        };

        // Non-positive price
        h.set_price(0);
        assert_matches!(h.oracle.commit(&h.pair), Err(OracleError::InvalidPrice { value: 0, .. }));
        assert_unchanged(&h.oracle, &h.pair);

        h.set_price(-5);
        assert_matches!(h.oracle.commit(&h.pair), Err(OracleError::InvalidPrice { .. }));
        assert_unchanged(&h.oracle, &h.pair);

        // Feed changed its scale
        h.prices
            .set_latest_price(&h.pair, PriceQuote::new(21_500_000_000_000_000, 15));
        assert_matches!(
            h.oracle.commit(&h.pair),
            Err(OracleError::DecimalsMismatch { expected: 8, actual: 15, .. })
        );
        assert_unchanged(&h.oracle, &h.pair);

        // Feed error
        h.prices.remove(&h.pair);
        assert_matches!(h.oracle.commit(&h.pair), Err(OracleError::PriceUnavailable { .. }));
        assert_unchanged(&h.oracle, &h.pair);

        // Overflowing ratio
        h.set_price(i128::MAX);
        assert_matches!(h.oracle.commit(&h.pair), Err(OracleError::Overflow(_)));
        assert_unchanged(&h.oracle, &h.pair);

        // Too early, even with a valid price
        h.set_price(2_200_000_000);
        h.clock.set(before.last_commit_timestamp + 1);
        assert_matches!(h.oracle.commit(&h.pair), Err(OracleError::TooEarly { .. }));
        assert_unchanged(&h.oracle, &h.pair);
    }

    #[test]
    fn test_aggregates_consistent_through_eviction() {
        let window_size = 5;
        let mut h = Harness::new(window_size);
        let mut price: i128 = 2_000_000_000;

        for i in 0..(window_size as i128 + 12) {
            // Alternating moves of varying size
            let step = 10_000_000 * (i % 7 + 1);
            price = if i % 2 == 0 { price + step } else { price - step / 2 };
            h.commit_at_price(price).unwrap();
            assert!(h.oracle.verify_aggregates(&h.pair).unwrap());
        }

        let snapshot = h.oracle.snapshot(&h.pair).unwrap();
        assert_eq!(snapshot.observation_count, window_size + 12);
        assert_eq!(snapshot.observations.len(), window_size as usize);
        assert_eq!(snapshot.valid_observations(), window_size);
        assert_eq!(snapshot.running_sum, snapshot.observations.iter().sum::<i128>());
    }

    #[test]
    fn test_sample_estimator() {
        let config =
            PoolConfig::with_estimator(DAY, 90, HOUR, VarianceEstimator::Sample).unwrap();
        let mut h = Harness::with_config(config);

        h.commit_at_price(2_000_000_000).unwrap();
        let receipt = h.commit_at_price(2_100_000_000).unwrap();
        assert_eq!(receipt.vol, 3_449_985);
    }

    #[test]
    fn test_annualized_vol() {
        let mut h = Harness::new(90);
        for price in [2_000_000_000, 2_100_000_000, 2_200_000_000, 2_150_000_000] {
            h.commit_at_price(price).unwrap();
        }
        assert_eq!(h.oracle.annualized_vol(&h.pair).unwrap(), 58_617_859);
    }

    #[test]
    fn test_pools_are_independent() {
        let mut h = Harness::new(90);
        let weth = AssetPair::new("WETH", "USDC");
        h.oracle.init_pool(&weth).unwrap();
        h.prices
            .set_latest_price(&weth, PriceQuote::new(160_000_000_000, 8));

        h.oracle.commit(&weth).unwrap();
        h.set_price(2_000_000_000);
        h.oracle.commit(&h.pair).unwrap();

        assert_eq!(h.oracle.pairs(), vec![h.pair.clone(), weth.clone()]);
        assert_eq!(h.oracle.snapshot(&weth).unwrap().observation_count, 1);
        assert_eq!(h.oracle.snapshot(&h.pair).unwrap().observation_count, 1);
    }

    #[test]
    fn test_one_commit_per_period_for_any_accepted_phase() {
        let phases = [0, 1, HOUR, 6 * HOUR, DAY / 2 - 1, DAY / 2];
        let offsets = [0, 2 * HOUR, DAY / 2 - 1, DAY / 2, 22 * HOUR, DAY - 1];

        for &phase in &phases {
            for &offset in &offsets {
                let mut h = Harness::with_config(PoolConfig::new(DAY, 90, phase).unwrap());
                h.clock.set(100 * DAY + offset);
                h.set_price(2_000_000_000);
                let first = h.oracle.commit(&h.pair).unwrap();

                // Same second, then one second before the window
                assert_matches!(
                    h.oracle.commit(&h.pair),
                    Err(OracleError::TooEarly { .. }),
                    "phase={} offset={}",
                    phase,
                    offset
                );
                let opens_at = h.oracle.commit_window_opens_at(&h.pair).unwrap();
                assert!(opens_at > first.committed_at);
                h.clock.set(opens_at - 1);
                assert_matches!(h.oracle.commit(&h.pair), Err(OracleError::TooEarly { .. }));

                h.clock.set(opens_at);
                h.set_price(2_100_000_000);
                let second = h.oracle.commit(&h.pair).unwrap();
                assert_eq!(second.observation_count, 2);
                assert_matches!(h.oracle.commit(&h.pair), Err(OracleError::TooEarly { .. }));
                assert_eq!(h.oracle.snapshot(&h.pair).unwrap().observation_count, 2);
            }
        }
    }

    #[test]
    fn test_vol_scales_with_feed_decimals() {
        // ln(1.05) / 2 at 18 decimals
        let stdev_wad: u128 = 24_395_082_084_715_988;

        for decimals in [0u8, 6, 8, 12, 18] {
            let mut h = Harness::new(90);
            let unit = 10i128.pow(u32::from(decimals));

            h.set_quote(20 * unit, decimals);
            h.oracle.commit(&h.pair).unwrap();
            h.clock.set(101 * DAY);
            h.set_quote(21 * unit, decimals);
            let receipt = h.oracle.commit(&h.pair).unwrap();

            assert_eq!(receipt.log_return, 48_790_164_169_431_991, "decimals={}", decimals);
            assert_eq!(
                receipt.vol,
                stdev_wad / 10u128.pow(u32::from(18 - decimals)),
                "decimals={}",
                decimals
            );
        }
    }

    #[test]
    fn test_18_decimal_feed_at_market_prices() {
        let mut h = Harness::new(90);
        let wad = WAD as i128;

        h.set_quote(3_000 * wad, 18);
        h.oracle.commit(&h.pair).unwrap();
        h.clock.set(101 * DAY);
        h.set_quote(3_100 * wad, 18);
        let receipt = h.oracle.commit(&h.pair).unwrap();

        assert_eq!(receipt.observation_count, 2);
        // ln(31 / 30) = 0.032789822822990870...
        assert!((receipt.log_return - 32_789_822_822_990_870).abs() < 1_000_000);
        // Population stdev of [0, r] is r / 2
        assert!((receipt.vol as i128 - receipt.log_return / 2).abs() <= 1_000);
        assert!(h.oracle.verify_aggregates(&h.pair).unwrap());

        // BTC-sized prices
        h.clock.set(102 * DAY);
        h.set_quote(60_000 * wad, 18);
        assert!(h.oracle.commit(&h.pair).unwrap().log_return > 0);
    }
}
