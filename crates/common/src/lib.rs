//! Common types and utilities for the volatility oracle workspace
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Shared domain types (Symbol, AssetPair)

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
