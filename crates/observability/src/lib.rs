//! Observability infrastructure for the volatility oracle
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics for pool commits and volatility reads
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("volx", LogFormat::Pretty, "info")?;
//!
//! // Optional
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{init_metrics, CommitTimer, OracleMetrics};
