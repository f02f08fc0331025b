//! Management Dispatcher
//!
//! Typed command surface over deployed tokens and the registry. Requests
//! arriving as `(action, params)` pairs are parsed into a closed set of
//! commands; anything else is rejected with `UnknownAction` before any
//! ledger interaction.

use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::orchestrator::{DeploymentOrchestrator, OrchestratorError};
use crate::adapters::contract::{ContractError, TokenInfo};
use crate::domain::{FeePercentages, RegistryEntry, RegistrySummary};
use crate::ports::TxReceipt;

const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid parameters for {action}: {reason}")]
    InvalidParams { action: String, reason: String },

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Commands against one deployed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCommand {
    GetInfo,
    GetFees,
    SetFees(FeePercentages),
    Transfer { to: Address, amount: Decimal },
    ExcludeFromFee { address: Address },
    IncludeInFee { address: Address },
}

/// Commands against the shared registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCommand {
    GetAnalytics,
    SetServiceFee { fee: Decimal },
    WithdrawFees,
    GetTokenList { size: u64, cursor: u64 },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetFeesParams {
    reflection_fee: Decimal,
    liquidity_fee: Decimal,
    treasury_fee: Decimal,
    burn_fee: Decimal,
}

#[derive(Deserialize)]
struct TransferParams {
    to: Address,
    amount: Decimal,
}

#[derive(Deserialize)]
struct AddressParams {
    address: Address,
}

#[derive(Deserialize)]
struct ServiceFeeParams {
    fee: Decimal,
}

#[derive(Deserialize)]
struct TokenListParams {
    #[serde(default = "default_page_size")]
    size: u64,
    #[serde(default)]
    cursor: u64,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn params<T: serde::de::DeserializeOwned>(action: &str, value: Value) -> Result<T, DispatchError> {
    // absent params behave like an empty object
    let value = if value.is_null() { Value::Object(Default::default()) } else { value };
    serde_json::from_value(value).map_err(|e| DispatchError::InvalidParams {
        action: action.to_string(),
        reason: e.to_string(),
    })
}

impl TokenCommand {
    pub fn parse(action: &str, value: Value) -> Result<Self, DispatchError> {
        match action {
            "getInfo" => Ok(TokenCommand::GetInfo),
            "getFees" => Ok(TokenCommand::GetFees),
            "setFees" => {
                let p: SetFeesParams = params(action, value)?;
                Ok(TokenCommand::SetFees(FeePercentages::new(
                    p.reflection_fee,
                    p.liquidity_fee,
                    p.treasury_fee,
                    p.burn_fee,
                    false,
                )))
            }
            "transfer" => {
                let p: TransferParams = params(action, value)?;
                Ok(TokenCommand::Transfer { to: p.to, amount: p.amount })
            }
            "excludeFromFee" => {
                let p: AddressParams = params(action, value)?;
                Ok(TokenCommand::ExcludeFromFee { address: p.address })
            }
            "includeInFee" => {
                let p: AddressParams = params(action, value)?;
                Ok(TokenCommand::IncludeInFee { address: p.address })
            }
            other => Err(DispatchError::UnknownAction(other.to_string())),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            TokenCommand::GetInfo => "getInfo",
            TokenCommand::GetFees => "getFees",
            TokenCommand::SetFees(_) => "setFees",
            TokenCommand::Transfer { .. } => "transfer",
            TokenCommand::ExcludeFromFee { .. } => "excludeFromFee",
            TokenCommand::IncludeInFee { .. } => "includeInFee",
        }
    }
}

impl RegistryCommand {
    pub fn parse(action: &str, value: Value) -> Result<Self, DispatchError> {
        match action {
            "getAnalytics" => Ok(RegistryCommand::GetAnalytics),
            "setServiceFee" => {
                let p: ServiceFeeParams = params(action, value)?;
                Ok(RegistryCommand::SetServiceFee { fee: p.fee })
            }
            "withdrawFees" => Ok(RegistryCommand::WithdrawFees),
            "getTokenList" => {
                let p: TokenListParams = params(action, value)?;
                Ok(RegistryCommand::GetTokenList {
                    size: p.size,
                    cursor: p.cursor,
                })
            }
            other => Err(DispatchError::UnknownAction(other.to_string())),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            RegistryCommand::GetAnalytics => "getAnalytics",
            RegistryCommand::SetServiceFee { .. } => "setServiceFee",
            RegistryCommand::WithdrawFees => "withdrawFees",
            RegistryCommand::GetTokenList { .. } => "getTokenList",
        }
    }
}

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandOutcome {
    TokenInfo(TokenInfo),
    Fees(FeePercentages),
    Analytics(RegistrySummary),
    TokenList(Vec<RegistryEntry>),
    Receipt(TxReceipt),
}

/// Runs commands with the orchestrator's deployer as authority
pub struct Dispatcher<'a> {
    orchestrator: &'a DeploymentOrchestrator,
}

impl<'a> Dispatcher<'a> {
    pub fn new(orchestrator: &'a DeploymentOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Parse and run a token request in one step
    pub async fn handle_token_request(
        &self,
        token: Address,
        action: &str,
        value: Value,
    ) -> Result<CommandOutcome, DispatchError> {
        let command = TokenCommand::parse(action, value)?;
        self.dispatch_token(token, command).await
    }

    /// Parse and run a registry request in one step
    pub async fn handle_registry_request(&self, action: &str, value: Value) -> Result<CommandOutcome, DispatchError> {
        let command = RegistryCommand::parse(action, value)?;
        self.dispatch_registry(command).await
    }

    pub async fn dispatch_token(&self, token: Address, command: TokenCommand) -> Result<CommandOutcome, DispatchError> {
        tracing::debug!("Dispatching {} on token {:?}", command.action(), token);
        let contract = self.orchestrator.token(token);

        let outcome = match command {
            TokenCommand::GetInfo => CommandOutcome::TokenInfo(contract.token_info().await?),
            TokenCommand::GetFees => CommandOutcome::Fees(contract.fee_info().await?),
            TokenCommand::SetFees(fees) => CommandOutcome::Receipt(contract.set_fees(&fees).await?),
            TokenCommand::Transfer { to, amount } => CommandOutcome::Receipt(contract.transfer(to, amount).await?),
            TokenCommand::ExcludeFromFee { address } => {
                CommandOutcome::Receipt(contract.exclude_from_fee(address).await?)
            }
            TokenCommand::IncludeInFee { address } => CommandOutcome::Receipt(contract.include_in_fee(address).await?),
        };
        Ok(outcome)
    }

    pub async fn dispatch_registry(&self, command: RegistryCommand) -> Result<CommandOutcome, DispatchError> {
        let registry = self
            .orchestrator
            .registry()
            .ok_or(OrchestratorError::NotInitialized)?;
        tracing::debug!("Dispatching {} on registry {:?}", command.action(), registry.address());

        let outcome = match command {
            RegistryCommand::GetAnalytics => CommandOutcome::Analytics(registry.summary().await?),
            RegistryCommand::SetServiceFee { fee } => CommandOutcome::Receipt(registry.set_service_fee(fee).await?),
            RegistryCommand::WithdrawFees => CommandOutcome::Receipt(registry.withdraw_fees().await?),
            RegistryCommand::GetTokenList { size, cursor } => {
                CommandOutcome::TokenList(registry.list_tokens(size, cursor).await?)
            }
        };
        Ok(outcome)
    }
}
