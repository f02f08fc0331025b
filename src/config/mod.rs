//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, DeploymentSection, LedgerSection, LoggingSection, load_config, DEPLOYER_ENV,
};
