//! Token Configuration and Deployment Records

use ethers::types::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fees::FeePercentages;

/// Contract artifact deployed for every token
pub const TOKEN_ARTIFACT: &str = "RexasErc20";

/// Uniswap V2 router used by the bundled presets
pub const UNISWAP_V2_ROUTER: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";

/// Default service fee paid to the registry (ETH)
pub const DEFAULT_SERVICE_FEE_ETH: Decimal = dec!(0.2);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("Token name cannot be empty")]
    EmptyName,
    #[error("Token symbol cannot be empty")]
    EmptySymbol,
    #[error("Total supply must be positive, got {0}")]
    NonPositiveSupply(Decimal),
    #[error("Service fee must be positive, got {0}")]
    NonPositiveServiceFee(Decimal),
}

/// Everything needed to deploy one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    /// Whole tokens; 9 decimals are applied at deployment
    pub total_supply: Decimal,
    pub router_address: Address,
    pub treasury_address: Address,
    pub fees: FeePercentages,
    /// Payable service fee in ETH
    pub service_fee: Decimal,
}

impl TokenConfig {
    pub fn validate(&self) -> Result<(), TokenConfigError> {
        if self.name.trim().is_empty() {
            return Err(TokenConfigError::EmptyName);
        }
        if self.symbol.trim().is_empty() {
            return Err(TokenConfigError::EmptySymbol);
        }
        if self.total_supply <= Decimal::ZERO {
            return Err(TokenConfigError::NonPositiveSupply(self.total_supply));
        }
        if self.service_fee <= Decimal::ZERO {
            return Err(TokenConfigError::NonPositiveServiceFee(self.service_fee));
        }
        Ok(())
    }
}

/// A token deployed by this orchestrator instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedToken {
    /// Address assigned by the ledger
    pub address: Address,
    pub config: TokenConfig,
}

impl DeployedToken {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }
}

/// Declarative token template; router and treasury are bound at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPreset {
    pub name: String,
    pub symbol: String,
    pub total_supply: Decimal,
    #[serde(flatten)]
    pub fees: FeePercentages,
    #[serde(default = "default_service_fee")]
    pub service_fee: Decimal,
}

fn default_service_fee() -> Decimal {
    DEFAULT_SERVICE_FEE_ETH
}

impl TokenPreset {
    pub fn into_config(self, router_address: Address, treasury_address: Address) -> TokenConfig {
        TokenConfig {
            name: self.name,
            symbol: self.symbol,
            total_supply: self.total_supply,
            router_address,
            treasury_address,
            fees: self.fees,
            service_fee: self.service_fee,
        }
    }
}

/// Bundled presets: balanced reflection, heavy burn, liquidity focused
pub fn default_presets() -> Vec<TokenPreset> {
    vec![
        TokenPreset {
            name: "Reflection Token".to_string(),
            symbol: "RFLX".to_string(),
            total_supply: dec!(1000000),
            fees: FeePercentages::new(dec!(2), dec!(3), dec!(1), dec!(0.5), false),
            service_fee: DEFAULT_SERVICE_FEE_ETH,
        },
        TokenPreset {
            name: "High Burn Token".to_string(),
            symbol: "BURN".to_string(),
            total_supply: dec!(500000),
            fees: FeePercentages::new(dec!(1), dec!(2), dec!(0.5), dec!(3), true),
            service_fee: DEFAULT_SERVICE_FEE_ETH,
        },
        TokenPreset {
            name: "Liquidity Token".to_string(),
            symbol: "LIQ".to_string(),
            total_supply: dec!(2000000),
            fees: FeePercentages::new(dec!(0.5), dec!(5), dec!(0.5), dec!(0), false),
            service_fee: DEFAULT_SERVICE_FEE_ETH,
        },
    ]
}
