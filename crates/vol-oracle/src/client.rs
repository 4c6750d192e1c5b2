use std::sync::Arc;
use tokio::sync::RwLock;

use common::AssetPair;

use crate::oracle::VolatilityOracle;
use crate::types::{CommitReceipt, PoolSnapshot};
use crate::Result;

/// Shared async handle over one oracle.
/// Commits take the write lock; reads share the read lock.
#[derive(Clone)]
pub struct OracleClient {
    oracle: Arc<RwLock<VolatilityOracle>>,
}

impl OracleClient {
    pub fn new(oracle: VolatilityOracle) -> Self {
        Self {
            oracle: Arc::new(RwLock::new(oracle)),
        }
    }

    pub fn from_shared(oracle: Arc<RwLock<VolatilityOracle>>) -> Self {
        Self { oracle }
    }

    pub async fn init_pool(&self, pair: &AssetPair) -> Result<()> {
        let mut oracle = self.oracle.write().await;
        oracle.init_pool(pair)
    }

    pub async fn commit(&self, pair: &AssetPair) -> Result<CommitReceipt> {
        let mut oracle = self.oracle.write().await;
        oracle.commit(pair)
    }

    pub async fn vol(&self, pair: &AssetPair) -> Result<u128> {
        let oracle = self.oracle.read().await;
        oracle.vol(pair)
    }

    pub async fn annualized_vol(&self, pair: &AssetPair) -> Result<u128> {
        let oracle = self.oracle.read().await;
        oracle.annualized_vol(pair)
    }

    pub async fn snapshot(&self, pair: &AssetPair) -> Result<PoolSnapshot> {
        let oracle = self.oracle.read().await;
        oracle.snapshot(pair)
    }

    pub async fn is_commit_window_open(&self, pair: &AssetPair) -> Result<bool> {
        let oracle = self.oracle.read().await;
        oracle.is_commit_window_open(pair)
    }

    pub async fn is_initialized(&self, pair: &AssetPair) -> bool {
        let oracle = self.oracle.read().await;
        oracle.is_initialized(pair)
    }

    pub async fn pairs(&self) -> Vec<AssetPair> {
        let oracle = self.oracle.read().await;
        oracle.pairs()
    }

    pub fn oracle(&self) -> Arc<RwLock<VolatilityOracle>> {
        Arc::clone(&self.oracle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::OracleError;
    use crate::price_source::StaticPriceSource;
    use crate::types::{PoolConfig, PriceQuote};
    use assert_matches::assert_matches;

    fn client() -> (OracleClient, Arc<StaticPriceSource>, Arc<ManualClock>) {
        let prices = Arc::new(StaticPriceSource::default());
        let clock = Arc::new(ManualClock::new(86_400));
        let config = PoolConfig::new(86_400, 90, 3_600).unwrap();
        let oracle = VolatilityOracle::new(config, prices.clone(), clock.clone());
        (OracleClient::new(oracle), prices, clock)
    }

    #[tokio::test]
    async fn test_commit_through_client() {
        let (client, prices, clock) = client();
        let pair = AssetPair::new("WBTC", "USDC");

        client.init_pool(&pair).await.unwrap();
        prices.set_latest_price(&pair, PriceQuote::new(2_000_000_000, 8));
        client.commit(&pair).await.unwrap();

        clock.set(2 * 86_400);
        prices.set_latest_price(&pair, PriceQuote::new(2_100_000_000, 8));
        let receipt = client.commit(&pair).await.unwrap();

        assert_eq!(receipt.vol, 2_439_508);
        assert_eq!(client.vol(&pair).await.unwrap(), 2_439_508);
        assert_eq!(client.snapshot(&pair).await.unwrap().observation_count, 2);
        assert!(!client.is_commit_window_open(&pair).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_committed_state() {
        let (client, prices, _clock) = client();
        let pair = AssetPair::new("WETH", "USDC");
        client.init_pool(&pair).await.unwrap();
        prices.set_latest_price(&pair, PriceQuote::new(160_000_000_000, 8));

        let writer = {
            let client = client.clone();
            let pair = pair.clone();
            tokio::spawn(async move { client.commit(&pair).await })
        };
        let readers: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                let pair = pair.clone();
                tokio::spawn(async move { client.snapshot(&pair).await })
            })
            .collect();

        writer.await.unwrap().unwrap();
        for reader in readers {
            let snapshot = reader.await.unwrap().unwrap();
            // Either before or after the commit, never in between
            match snapshot.observation_count {
                0 => assert_eq!(snapshot.last_price, None),
                1 => assert_eq!(snapshot.observations, vec![0]),
                n => panic!("unexpected observation count {}", n),
            }
        }

        assert_matches!(client.commit(&pair).await, Err(OracleError::TooEarly { .. }));
        assert_eq!(client.pairs().await, vec![pair]);
    }
}
