//! Spot price feeds consumed by commits

use crate::error::OracleError;
use crate::types::{check_decimals, PriceQuote};
use crate::Result;
use common::AssetPair;
use config::PriceSourceConfig;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Trait for providing spot prices.
/// Allows a live feed in production and a fixed table in tests and replay.
pub trait PriceSource: Send + Sync {
    /// Latest price of `pair.underlying` in units of `pair.quote`
    fn latest_price(&self, pair: &AssetPair) -> Result<PriceQuote>;
}

/// In-memory price table, seeded from config and updatable at runtime
#[derive(Debug, Default)]
pub struct StaticPriceSource {
    prices: RwLock<HashMap<AssetPair, PriceQuote>>,
}

impl StaticPriceSource {
    pub fn new(prices: HashMap<AssetPair, PriceQuote>) -> Self {
        Self {
            prices: RwLock::new(prices),
        }
    }

    pub fn from_config(config: &PriceSourceConfig) -> Result<Self> {
        let mut prices = HashMap::new();
        for entry in &config.static_prices {
            let pair: AssetPair = entry
                .pair
                .parse()
                .map_err(|e: common::Error| OracleError::Config(e.to_string()))?;
            check_decimals(entry.decimals)?;
            prices.insert(pair, PriceQuote::new(i128::from(entry.value), entry.decimals));
        }
        Ok(Self::new(prices))
    }

    pub fn set_latest_price(&self, pair: &AssetPair, quote: PriceQuote) {
        self.prices.write().insert(pair.clone(), quote);
    }

    pub fn remove(&self, pair: &AssetPair) -> Option<PriceQuote> {
        self.prices.write().remove(pair)
    }

    pub fn len(&self) -> usize {
        self.prices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.read().is_empty()
    }
}

impl PriceSource for StaticPriceSource {
    fn latest_price(&self, pair: &AssetPair) -> Result<PriceQuote> {
        self.prices
            .read()
            .get(pair)
            .copied()
            .ok_or_else(|| OracleError::PriceUnavailable {
                pair: pair.clone(),
                reason: "no price configured".to_string(),
            })
    }
}
