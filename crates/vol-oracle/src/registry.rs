//! Per-pair pool storage

use crate::error::OracleError;
use crate::types::{PoolSnapshot, PriceQuote};
use crate::window::RollingWindow;
use crate::Result;
use common::AssetPair;
use std::collections::HashMap;

/// Volatility state for one asset pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub(crate) initialized: bool,
    pub(crate) last_price: Option<PriceQuote>,
    pub(crate) last_commit_timestamp: u64,
    pub(crate) window: RollingWindow,
}

impl Pool {
    fn new(window_size: usize) -> Self {
        Self {
            initialized: true,
            last_price: None,
            last_commit_timestamp: 0,
            window: RollingWindow::new(window_size),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn last_price(&self) -> Option<PriceQuote> {
        self.last_price
    }

    pub fn last_commit_timestamp(&self) -> u64 {
        self.last_commit_timestamp
    }

    /// Decimal base pinned by the first commit
    pub fn decimals(&self) -> Option<u8> {
        self.last_price.map(|p| p.decimals)
    }

    pub fn observation_count(&self) -> u64 {
        self.window.count()
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn snapshot(&self, pair: &AssetPair) -> PoolSnapshot {
        PoolSnapshot {
            pair: pair.clone(),
            initialized: self.initialized,
            last_price: self.last_price,
            last_commit_timestamp: self.last_commit_timestamp,
            observation_count: self.window.count(),
            window_size: self.window.capacity() as u64,
            running_sum: self.window.sum(),
            running_sum_squares: self.window.sum_squares(),
            observations: self.window.observations(),
        }
    }
}

/// Keyed pool store. Pools are never removed.
#[derive(Debug, Clone)]
pub struct PoolRegistry {
    pools: HashMap<AssetPair, Pool>,
    window_size: usize,
}

impl PoolRegistry {
    pub fn new(window_size: usize) -> Self {
        Self {
            pools: HashMap::new(),
            window_size,
        }
    }

    pub fn init_pool(&mut self, pair: &AssetPair) -> Result<&Pool> {
        if self.pools.contains_key(pair) {
            return Err(OracleError::AlreadyInitialized(pair.clone()));
        }
        let window_size = self.window_size;
        Ok(self
            .pools
            .entry(pair.clone())
            .or_insert_with(|| Pool::new(window_size)))
    }

    pub fn get_pool(&self, pair: &AssetPair) -> Result<&Pool> {
        self.pools
            .get(pair)
            .ok_or_else(|| OracleError::NotInitialized(pair.clone()))
    }

    pub(crate) fn get_pool_mut(&mut self, pair: &AssetPair) -> Result<&mut Pool> {
        self.pools
            .get_mut(pair)
            .ok_or_else(|| OracleError::NotInitialized(pair.clone()))
    }

    pub fn contains(&self, pair: &AssetPair) -> bool {
        self.pools.contains_key(pair)
    }

    /// Registered pairs, sorted
    pub fn pairs(&self) -> Vec<AssetPair> {
        let mut pairs: Vec<AssetPair> = self.pools.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
