//! VolX Binary
//!
//! Entry point for the volatility oracle. Provides commands for
//! initializing and validating configuration, running the commit keeper,
//! and replaying price series offline.

use anyhow::{Context, Result};
use cli::{Cli, Commands, LogFormatArg};
use common::AssetPair;
use config::{
    generate_default_config, load_config, save_config, validate_config, MasterConfig,
    ValidationReport,
};
use observability::{init_logging, init_metrics, LogFormat, OracleMetrics};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vol_oracle::calculator::annualize;
use vol_oracle::{
    replay_prices, CommitKeeper, OracleClient, PoolConfig, PriceQuote, ShutdownController,
    StaticPriceSource, SystemClock, VolatilityOracle,
};

const SERVICE_NAME: &str = "volx";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            config,
            metrics_port,
        } => {
            let master = load_config(&config)?;
            init_command_logging(cli.log_format, Some(&master))?;
            info!("Executing 'run' command");
            run_command(master, metrics_port).await
        }
        Commands::Validate { config } => {
            init_command_logging(cli.log_format, None)?;
            info!("Executing 'validate' command");
            validate_command(config)
        }
        Commands::Init { output } => {
            init_command_logging(cli.log_format, None)?;
            info!("Executing 'init' command");
            init_command(output)
        }
        Commands::Replay {
            config,
            pair,
            decimals,
            json,
            prices,
        } => {
            let master = load_config(&config)?;
            init_command_logging(cli.log_format, Some(&master))?;
            debug!(?pair, decimals, count = prices.len(), "Executing 'replay' command");
            replay_command(&master, &pair, decimals, &prices, json)
        }
    }
}

/// CLI flag first, then the config file's logging section
fn init_command_logging(flag: Option<LogFormatArg>, config: Option<&MasterConfig>) -> Result<()> {
    let logging = config.map(|c| c.logging()).unwrap_or_default();
    let format_name = flag.map(|f| f.as_str()).unwrap_or(logging.format.as_str());
    let format = LogFormat::parse(format_name)
        .with_context(|| format!("Unknown log format: {}", format_name))?;
    init_logging(SERVICE_NAME, format, &logging.level)
}

fn check_report(report: &ValidationReport) -> Result<()> {
    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start oracle due to configuration errors");
    }
    Ok(())
}

async fn run_command(config: MasterConfig, metrics_port: Option<u16>) -> Result<()> {
    check_report(&validate_config(&config))?;

    let metrics_config = config.metrics();
    if metrics_config.enabled || metrics_port.is_some() {
        init_metrics(metrics_port.unwrap_or(metrics_config.port))?;
    }

    let pool_config = PoolConfig::from_settings(&config.oracle)?;
    let price_source = Arc::new(
        StaticPriceSource::from_config(&config.price_source)
            .context("Invalid static price table")?,
    );
    let oracle = VolatilityOracle::new(pool_config, price_source, Arc::new(SystemClock));
    let client = OracleClient::new(oracle);

    let pairs: Vec<AssetPair> = config
        .enabled_pairs()
        .map(|p| AssetPair::new(p.underlying.as_str(), p.quote.as_str()))
        .collect();

    info!(
        pairs = pairs.len(),
        period = pool_config.period,
        window = pool_config.window_size,
        commit_phase = pool_config.commit_phase_duration,
        estimator = %pool_config.estimator,
        "Starting oracle"
    );

    let keeper_config = config.keeper();
    let keeper_enabled = keeper_config.enabled;
    let keeper = CommitKeeper::new(
        client.clone(),
        pairs,
        keeper_config,
        OracleMetrics::new(SERVICE_NAME),
    );

    if !keeper_enabled {
        let created = keeper.initialize_pools().await;
        info!(created, "Keeper disabled; pools initialized, exiting");
        return Ok(());
    }

    let shutdown = ShutdownController::with_ctrl_c();
    keeper.run(shutdown.child_token()).await;

    for pair in client.pairs().await {
        let snapshot = client.snapshot(&pair).await?;
        let vol = client.vol(&pair).await?;
        info!(
            pair = %pair,
            observations = snapshot.observation_count,
            vol,
            "Final pool state"
        );
    }

    info!("Oracle stopped");
    Ok(())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Period: {}s", config.oracle.period_seconds);
    println!("Window: {} observations", config.oracle.window_size);
    println!("Commit phase: {}s", config.oracle.commit_phase_duration_seconds);
    println!("Estimator: {}", config.oracle.estimator);
    println!(
        "Pairs: {} ({} enabled)",
        config.pairs.len(),
        config.enabled_pairs().count()
    );

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("This configuration includes:");
    println!("  - Daily period, 90-observation window, 1h commit phase");
    println!("  - {} pairs with static seed prices", config.pairs.len());
    println!();
    println!("Next steps:");
    println!("  1. Edit the configuration file to customize pairs and prices");
    println!(
        "  2. Run 'volx validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'volx run --config {:?}' to start the keeper",
        output_path
    );

    Ok(())
}

fn replay_command(
    config: &MasterConfig,
    pair: &str,
    decimals: u8,
    prices: &[i128],
    json: bool,
) -> Result<()> {
    let pool_config = PoolConfig::from_settings(&config.oracle)?;
    let pair: AssetPair = pair.parse()?;
    let quotes: Vec<PriceQuote> = prices
        .iter()
        .map(|&value| PriceQuote::new(value, decimals))
        .collect();

    let receipts = replay_prices(pool_config, &pair, &quotes)
        .with_context(|| format!("Replay of {} failed", pair))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipts)?);
        return Ok(());
    }

    println!(
        "{} | period {}s | window {} | {} estimator | {} decimals",
        pair, pool_config.period, pool_config.window_size, pool_config.estimator, decimals
    );
    println!(
        "{:>4}  {:>12}  {:>20}  {:>22}  {:>14}  {:>14}",
        "#", "at", "price", "log return (1e18)", "vol", "annualized"
    );
    for (i, receipt) in receipts.iter().enumerate() {
        let annualized = annualize(receipt.vol, pool_config.period)?;
        println!(
            "{:>4}  {:>12}  {:>20}  {:>22}  {:>14}  {:>14}",
            i + 1,
            receipt.committed_at,
            receipt.price.value,
            receipt.log_return,
            receipt.vol,
            annualized
        );
    }

    Ok(())
}
