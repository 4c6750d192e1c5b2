use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "volx")]
#[command(about = "VolX - periodic price-commit volatility oracle")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Log output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize pools and run the commit keeper until Ctrl+C
    Run {
        /// Path to the configuration file
        #[arg(short, long, default_value = "oracle_config/oracle_config.yaml")]
        config: PathBuf,

        /// Override the metrics port
        #[arg(long)]
        metrics_port: Option<u16>,
    },

    /// Validate configuration without starting the keeper
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "oracle_config/oracle_config.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "oracle_config.yaml")]
        output: PathBuf,
    },

    /// Replay a price series and print the volatility after each commit
    Replay {
        /// Configuration supplying period, window and estimator
        #[arg(short, long, default_value = "oracle_config/oracle_config.yaml")]
        config: PathBuf,

        /// Pair label, e.g. WBTC/USDC
        #[arg(short, long, default_value = "WBTC/USDC")]
        pair: String,

        /// Decimal base of the prices
        #[arg(short, long, default_value_t = 8)]
        decimals: u8,

        /// Print receipts as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Raw feed values, oldest first
        #[arg(required = true, num_args = 1..)]
        prices: Vec<i128>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
