//! Feeforge - complete paper-mode setup run
//!
//! Deploys the registry and the configured preset batch against the paper
//! ledger, prints the analytics report, then exercises a few management
//! commands.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use feeforge::adapters::PaperLedger;
use feeforge::application::{DeploymentOrchestrator, Dispatcher};
use feeforge::config::{load_config, Config};

const CONFIG_ENV: &str = "FEEFORGE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/paper.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let config = load_configuration()?;
    init_logging(&config.logging.level);

    run_setup(config).await
}

fn load_configuration() -> Result<Config> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_config(&path).with_context(|| format!("Failed to load configuration from {}", path))
    } else {
        let config = Config::default();
        config.validate().context("Built-in configuration is invalid")?;
        Ok(config)
    }
}

/// RUST_LOG wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).init();
}

async fn run_setup(config: Config) -> Result<()> {
    tracing::info!("Starting Feeforge setup...");
    tracing::warn!("PAPER MODE - no real transactions");

    let deployer = config.ledger.deployer_address()?;
    let router = config.deployment.router()?;
    let treasury = config.deployment.treasury(deployer)?;

    let ledger = Arc::new(PaperLedger::new());
    let mut orchestrator = DeploymentOrchestrator::new(ledger, deployer);

    let registry = orchestrator
        .deploy_registry()
        .await
        .context("Failed to deploy registry")?;
    tracing::info!("Registry ready at {:?}", registry);

    let tokens = orchestrator
        .deploy_preset_batch(&config.presets, router, treasury)
        .await
        .context("Preset batch deployment failed")?;
    tracing::info!("Deployed {} token(s)", tokens.len());

    let report = orchestrator.report().await.context("Failed to build analytics report")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let dispatcher = Dispatcher::new(&orchestrator);
    if let Some(first) = tokens.first() {
        for action in ["getInfo", "getFees"] {
            let outcome = dispatcher
                .handle_token_request(*first, action, Value::Null)
                .await
                .with_context(|| format!("{} failed on {:?}", action, first))?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    let analytics = dispatcher
        .handle_registry_request("getAnalytics", Value::Null)
        .await
        .context("getAnalytics failed")?;
    println!("{}", serde_json::to_string_pretty(&analytics)?);

    tracing::info!("Feeforge setup complete");
    Ok(())
}
