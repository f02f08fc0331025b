//! Deployment Orchestrator
//!
//! Provisions the shared registry, then tokens from configs or presets, and
//! keeps an append-only record of what it deployed.
//!
//! Lifecycle: `Uninitialized -> RegistryDeployed -> TokensDeployed`.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use std::sync::Arc;
use thiserror::Error;

use crate::adapters::contract::{ContractError, RegistryContract, TokenContract};
use crate::domain::units::{format_native, native_amount, token_amount};
use crate::domain::{
    AnalyticsReport, DeployedToken, FeeSettings, TokenConfig, TokenConfigError, TokenPreset, UnitError,
    REGISTRY_ARTIFACT, TOKEN_ARTIFACT,
};
use crate::ports::{LedgerClient, LedgerError};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Registry not deployed: call deploy_registry first")]
    RegistryNotDeployed,

    #[error("Registry already deployed at {0:?}")]
    RegistryAlreadyDeployed(Address),

    #[error("Orchestrator not initialized: no registry deployed")]
    NotInitialized,

    #[error("Analytics failed for token {token:?}: {source}")]
    PartialAnalyticsFailure {
        token: Address,
        #[source]
        source: ContractError,
    },

    #[error("Analytics task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid token config: {0}")]
    InvalidConfig(#[from] TokenConfigError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl OrchestratorError {
    /// Ledger failure behind this error, for transport or revert handling
    pub fn ledger_error(&self) -> Option<&LedgerError> {
        match self {
            OrchestratorError::PartialAnalyticsFailure { source, .. } => source.ledger_error(),
            OrchestratorError::Contract(e) => e.ledger_error(),
            _ => None,
        }
    }
}

/// Deployments have no address yet; the zero address stands in for it
fn deployment_failed(artifact: &str, source: LedgerError) -> OrchestratorError {
    OrchestratorError::Contract(ContractError::RemoteCallFailed {
        contract: Address::zero(),
        method: format!("deploy {}", artifact),
        source,
    })
}

/// Where the orchestrator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Uninitialized,
    RegistryDeployed,
    TokensDeployed(usize),
}

/// Owns the registry handle and the ordered deployment records
pub struct DeploymentOrchestrator {
    client: Arc<dyn LedgerClient>,
    deployer: Address,
    registry: Option<RegistryContract>,
    deployed: Vec<DeployedToken>,
}

impl DeploymentOrchestrator {
    /// `deployer` signs every deployment and becomes the authority of every
    /// proxy handed out by this orchestrator
    pub fn new(client: Arc<dyn LedgerClient>, deployer: Address) -> Self {
        Self {
            client,
            deployer,
            registry: None,
            deployed: Vec::new(),
        }
    }

    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn state(&self) -> OrchestratorState {
        match (&self.registry, self.deployed.len()) {
            (None, _) => OrchestratorState::Uninitialized,
            (Some(_), 0) => OrchestratorState::RegistryDeployed,
            (Some(_), n) => OrchestratorState::TokensDeployed(n),
        }
    }

    pub fn registry(&self) -> Option<&RegistryContract> {
        self.registry.as_ref()
    }

    pub fn registry_address(&self) -> Option<Address> {
        self.registry.as_ref().map(|r| r.address())
    }

    /// Deployment records, in deployment order
    pub fn deployed_tokens(&self) -> &[DeployedToken] {
        &self.deployed
    }

    /// Token proxy bound to the deployer's authority
    pub fn token(&self, address: Address) -> TokenContract {
        TokenContract::new(Arc::clone(&self.client), address, Some(self.deployer))
    }

    /// Deploy the shared fee registry; only valid once per orchestrator
    pub async fn deploy_registry(&mut self) -> Result<Address, OrchestratorError> {
        if let Some(existing) = self.registry_address() {
            return Err(OrchestratorError::RegistryAlreadyDeployed(existing));
        }

        let balance = self
            .client
            .balance_of(self.deployer)
            .await
            .map_err(|source| {
                OrchestratorError::Contract(ContractError::RemoteCallFailed {
                    contract: self.deployer,
                    method: "balance".to_string(),
                    source,
                })
            })?;
        tracing::info!(
            "Deploying {} contract with account {:?} (balance {} ETH)...",
            REGISTRY_ARTIFACT,
            self.deployer,
            format_native(balance)?
        );
        let address = self
            .client
            .deploy(REGISTRY_ARTIFACT, vec![], self.deployer, U256::zero())
            .await
            .map_err(|source| deployment_failed(REGISTRY_ARTIFACT, source))?;

        self.registry = Some(RegistryContract::new(
            Arc::clone(&self.client),
            address,
            Some(self.deployer),
        ));
        tracing::info!("{} deployed to {:?}", REGISTRY_ARTIFACT, address);
        Ok(address)
    }

    /// Deploy one token, paying the service fee to the registry
    pub async fn deploy_token(&mut self, config: TokenConfig) -> Result<Address, OrchestratorError> {
        let registry = self
            .registry_address()
            .ok_or(OrchestratorError::RegistryNotDeployed)?;
        config.validate()?;

        let total_supply = token_amount(config.total_supply)?;
        let fees = FeeSettings::from_percentages(&config.fees)?;
        let service_fee = native_amount(config.service_fee)?;

        tracing::info!("Deploying {} ({}) token...", config.name, config.symbol);
        let args = vec![
            Token::String(config.name.clone()),
            Token::String(config.symbol.clone()),
            Token::Uint(total_supply),
            Token::Address(config.router_address),
            Token::Address(config.treasury_address),
            fees.to_abi(),
            Token::Address(registry),
        ];

        let address = self
            .client
            .deploy(TOKEN_ARTIFACT, args, self.deployer, service_fee)
            .await
            .map_err(|source| deployment_failed(TOKEN_ARTIFACT, source))?;

        tracing::info!(
            "{} deployed to {:?} (supply {}, fees {} bps, service fee {} ETH)",
            config.symbol,
            address,
            config.total_supply,
            fees.total_bps(),
            config.service_fee
        );
        self.deployed.push(DeployedToken { address, config });
        Ok(address)
    }

    /// Deploy presets one after another
    ///
    /// Stops at the first failure. Tokens deployed before it stay deployed and
    /// recorded; each deployment is its own irreversible transaction.
    pub async fn deploy_preset_batch(
        &mut self,
        presets: &[TokenPreset],
        router_address: Address,
        treasury_address: Address,
    ) -> Result<Vec<Address>, OrchestratorError> {
        let mut addresses = Vec::with_capacity(presets.len());

        for (index, preset) in presets.iter().enumerate() {
            let config = preset.clone().into_config(router_address, treasury_address);
            match self.deploy_token(config).await {
                Ok(address) => addresses.push(address),
                Err(e) => {
                    tracing::warn!(
                        "Batch stopped at preset {} of {} ({}): {}. {} token(s) remain deployed",
                        index + 1,
                        presets.len(),
                        preset.symbol,
                        e,
                        addresses.len()
                    );
                    return Err(e);
                }
            }
        }

        Ok(addresses)
    }

    /// Fresh analytics across the registry and every deployed token
    pub async fn report(&self) -> Result<AnalyticsReport, OrchestratorError> {
        super::analytics::build_report(self).await
    }
}
