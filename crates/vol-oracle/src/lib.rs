//! Volatility oracle for options pricing
//!
//! Tracks historical volatility per asset pair from periodic price commits.
//! Each commit records the log-return of the latest spot price against the
//! previous one into a fixed-size rolling window; `vol` turns the window's
//! running aggregates into a standard deviation.
//!
//! # Components
//!
//! - [`PeriodScheduler`]: when a pool may accept its next commit
//! - [`PoolRegistry`]: per-pair pool state
//! - [`RollingWindow`]: circular buffer with running sums
//! - [`calculator`]: variance and standard deviation
//! - [`VolatilityOracle`]: synchronous core tying the above together
//! - [`OracleClient`]: shared async handle over the core
//! - [`CommitKeeper`]: background worker committing on schedule
//!
//! # Example
//!
//! ```ignore
//! let oracle = VolatilityOracle::new(pool_config, price_source, clock);
//! oracle.init_pool(&pair)?;
//! let receipt = oracle.commit(&pair)?;
//! let vol = oracle.vol(&pair)?;
//! ```

pub mod calculator;
pub mod client;
pub mod clock;
pub mod error;
pub mod fixed_point;
pub mod keeper;
pub mod oracle;
pub mod price_source;
pub mod registry;
pub mod replay;
pub mod scheduler;
pub mod shutdown;
pub mod types;
pub mod window;

pub use client::OracleClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::OracleError;
pub use keeper::{CommitKeeper, KeeperReport};
pub use oracle::VolatilityOracle;
pub use price_source::{PriceSource, StaticPriceSource};
pub use registry::{Pool, PoolRegistry};
pub use replay::replay_prices;
pub use scheduler::{top_of_period, PeriodScheduler};
pub use shutdown::ShutdownController;
pub use types::{CommitReceipt, PoolConfig, PoolSnapshot, PriceQuote};
pub use window::RollingWindow;

pub use config::VarianceEstimator;

/// Result type for oracle operations
pub type Result<T> = std::result::Result<T, OracleError>;
