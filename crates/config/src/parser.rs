use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MasterConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    parse_config(&content)
}

/// Parse a configuration document after environment variable substitution
pub fn parse_config(content: &str) -> Result<MasterConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    debug!("Environment variable substitution completed");

    let config: MasterConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!(
        pairs = config.pairs.len(),
        period = config.oracle.period_seconds,
        window = config.oracle.window_size,
        "Configuration loaded successfully"
    );
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> MasterConfig {
    use defaults::*;

    MasterConfig {
        oracle: OracleSettings::default(),
        pairs: vec![
            PairConfig {
                underlying: "WBTC".to_string(),
                quote: "USDC".to_string(),
                enabled: true,
            },
            PairConfig {
                underlying: "WETH".to_string(),
                quote: "USDC".to_string(),
                enabled: true,
            },
        ],
        price_source: PriceSourceConfig {
            source_type: PriceSourceType::Static,
            static_prices: vec![
                StaticPriceConfig {
                    pair: "WBTC/USDC".to_string(),
                    value: 2_200_000_000_000,
                    decimals: default_price_decimals(),
                },
                StaticPriceConfig {
                    pair: "WETH/USDC".to_string(),
                    value: 160_000_000_000,
                    decimals: default_price_decimals(),
                },
            ],
        },
        // Optional sections fall back to their defaults
        keeper: None,
        logging: None,
        metrics: None,
    }
}

#[instrument(skip(config))]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &MasterConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}
