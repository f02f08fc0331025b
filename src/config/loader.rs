//! Configuration Loader
//!
//! Loads and validates the TOML configuration for a deployment run.

use ethers::types::Address;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::token::UNISWAP_V2_ROUTER;
use crate::domain::{default_presets, TokenPreset};

/// Environment variable overriding `[ledger].deployer`
pub const DEPLOYER_ENV: &str = "FEEFORGE_DEPLOYER";

/// Default deployer for paper runs
const PAPER_DEPLOYER: &str = "0x00000000000000000000000000000000000000d1";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ledger: LedgerSection,
    pub deployment: DeploymentSection,
    /// Token templates for the batch; bundled presets when omitted
    #[serde(default = "default_presets")]
    pub presets: Vec<TokenPreset>,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Ledger access configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSection {
    /// Account that signs deployments and administers deployed contracts
    pub deployer: String,
    /// Only "paper" is available; transports live outside this crate
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "paper".to_string()
}

impl LedgerSection {
    /// Get deployer with environment variable override
    /// Checks FEEFORGE_DEPLOYER env var first, falls back to config value
    pub fn get_deployer(&self) -> String {
        std::env::var(DEPLOYER_ENV).unwrap_or_else(|_| self.deployer.clone())
    }

    pub fn deployer_address(&self) -> Result<Address, ConfigError> {
        parse_address("deployer", &self.get_deployer())
    }
}

/// Deployment parameters shared by every token in a run
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentSection {
    pub router_address: String,
    /// Fee treasury; the deployer when omitted
    #[serde(default)]
    pub treasury_address: Option<String>,
}

impl DeploymentSection {
    pub fn router(&self) -> Result<Address, ConfigError> {
        parse_address("router_address", &self.router_address)
    }

    pub fn treasury(&self, deployer: Address) -> Result<Address, ConfigError> {
        match &self.treasury_address {
            Some(raw) => parse_address("treasury_address", raw),
            None => Ok(deployer),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

fn parse_address(field: &str, raw: &str) -> Result<Address, ConfigError> {
    Address::from_str(raw.trim())
        .map_err(|e| ConfigError::ValidationError(format!("{} is not a valid address ({}): {}", field, raw, e)))
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Default for Config {
    /// Paper run against the public router with the bundled presets
    fn default() -> Self {
        Self {
            ledger: LedgerSection {
                deployer: PAPER_DEPLOYER.to_string(),
                mode: default_mode(),
            },
            deployment: DeploymentSection {
                router_address: UNISWAP_V2_ROUTER.to_string(),
                treasury_address: None,
            },
            presets: default_presets(),
            logging: LoggingSection::default(),
        }
    }
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.mode != "paper" {
            return Err(ConfigError::ValidationError(format!(
                "ledger mode must be \"paper\", got \"{}\"",
                self.ledger.mode
            )));
        }

        let deployer = self.ledger.deployer_address()?;
        self.deployment.router()?;
        self.deployment.treasury(deployer)?;

        for preset in &self.presets {
            preset
                .clone()
                .into_config(Address::zero(), deployer)
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("preset {}: {}", preset.symbol, e)))?;

            for (label, rate) in [
                ("reflection", preset.fees.reflection),
                ("liquidity", preset.fees.liquidity),
                ("treasury", preset.fees.treasury),
                ("burn", preset.fees.burn),
            ] {
                if rate.is_sign_negative() || rate > rust_decimal::Decimal::ONE_HUNDRED {
                    return Err(ConfigError::ValidationError(format!(
                        "preset {}: {} fee must be 0-100, got {}",
                        preset.symbol, label, rate
                    )));
                }
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}, got \"{}\"",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}
