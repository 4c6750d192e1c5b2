//! Offline replay of a price series through a fresh oracle

use crate::clock::{Clock, ManualClock};
use crate::oracle::VolatilityOracle;
use crate::price_source::StaticPriceSource;
use crate::types::{CommitReceipt, PoolConfig, PriceQuote};
use crate::Result;
use common::AssetPair;
use std::sync::Arc;
use tracing::debug;

/// Commit `quotes` one period apart and return a receipt per price.
///
/// The clock starts on the first period boundary and moves to the next
/// top of period after every commit. Stops at the first rejected price.
pub fn replay_prices(
    config: PoolConfig,
    pair: &AssetPair,
    quotes: &[PriceQuote],
) -> Result<Vec<CommitReceipt>> {
    let prices = Arc::new(StaticPriceSource::default());
    let clock = Arc::new(ManualClock::new(config.period));
    let mut oracle = VolatilityOracle::new(config, prices.clone(), clock.clone());
    oracle.init_pool(pair)?;

    let mut receipts = Vec::with_capacity(quotes.len());
    for quote in quotes {
        prices.set_latest_price(pair, *quote);
        let receipt = oracle.commit(pair)?;
        debug!(at = clock.now(), vol = receipt.vol, "Replayed price");
        clock.set(oracle.scheduler().top_of_period(receipt.committed_at));
        receipts.push(receipt);
    }

    Ok(receipts)
}
