//! Common types used across the oracle workspace
//!
//! This module provides the key types every crate agrees on: asset
//! symbols and the (underlying, quote) pair that keys oracle pools.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Asset symbol (e.g., "WBTC", "USDC")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol, normalised to upper case
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Get the symbol as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> Self {
        s.0
    }
}

/// Asset pair keying an oracle pool (e.g., "WBTC/USDC")
///
/// The underlying is the asset whose volatility is tracked, the quote is
/// the asset it is priced in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub underlying: Symbol,
    pub quote: Symbol,
}

impl AssetPair {
    /// Create a new asset pair
    pub fn new(underlying: impl Into<Symbol>, quote: impl Into<Symbol>) -> Self {
        Self {
            underlying: underlying.into(),
            quote: quote.into(),
        }
    }

    /// Label used in logs and metrics (e.g., "WBTC/USDC")
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for AssetPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.underlying, self.quote)
    }
}

impl FromStr for AssetPair {
    type Err = Error;

    /// Parse "UNDERLYING/QUOTE" (a "-" separator is accepted too)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (underlying, quote) = s
            .split_once('/')
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| Error::invalid_input(format!("expected UNDERLYING/QUOTE, got '{}'", s)))?;

        let pair = AssetPair::new(underlying, quote);
        if pair.underlying.is_empty() || pair.quote.is_empty() {
            return Err(Error::invalid_input(format!("empty symbol in pair '{}'", s)));
        }
        if pair.underlying == pair.quote {
            return Err(Error::invalid_input(format!(
                "underlying and quote must differ in '{}'",
                s
            )));
        }

        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol() {
        let sym = Symbol::new(" wbtc ");
        assert_eq!(sym.as_str(), "WBTC");
    }

    #[test]
    fn test_asset_pair_display() {
        let pair = AssetPair::new("WBTC", "usdc");
        assert_eq!(pair.to_string(), "WBTC/USDC");
        assert_eq!(pair.label(), "WBTC/USDC");
    }

    #[test]
    fn test_asset_pair_parse() {
        let pair: AssetPair = "wbtc/usdc".parse().unwrap();
        assert_eq!(pair, AssetPair::new("WBTC", "USDC"));

        let dashed: AssetPair = "ETH-USDC".parse().unwrap();
        assert_eq!(dashed, AssetPair::new("ETH", "USDC"));
    }

    #[test]
    fn test_asset_pair_parse_rejects_garbage() {
        assert!("WBTC".parse::<AssetPair>().is_err());
        assert!("/USDC".parse::<AssetPair>().is_err());
        assert!("USDC/usdc".parse::<AssetPair>().is_err());
    }

    #[test]
    fn test_asset_pair_ordering() {
        let mut pairs = vec![
            AssetPair::new("WBTC", "USDC"),
            AssetPair::new("ETH", "USDC"),
            AssetPair::new("ETH", "DAI"),
        ];
        pairs.sort();
        assert_eq!(pairs[0].to_string(), "ETH/DAI");
        assert_eq!(pairs[2].to_string(), "WBTC/USDC");
    }

    #[test]
    fn test_symbol_serde_normalises() {
        let sym: Symbol = serde_json::from_str("\"weth\"").unwrap();
        assert_eq!(sym.as_str(), "WETH");
        assert_eq!(serde_json::to_string(&sym).unwrap(), "\"WETH\"");
    }
}
