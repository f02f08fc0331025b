//! Token Contract Adapter
//!
//! Typed surface of a deployed `RexasErc20`. Amounts cross this boundary in
//! whole tokens and percentages; the contract sees smallest units and basis
//! points.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use super::proxy::{ContractError, ContractProxy};
use crate::domain::units::{from_smallest_unit, to_basis_points, token_amount, TOKEN_DECIMALS};
use crate::domain::{FeeKind, FeePercentages, FeeRate, FeeSettings, OwnerBalance};
use crate::ports::{LedgerClient, TxReceipt};

/// Metadata read from the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// Whole tokens, formatted with the on-chain decimals
    pub total_supply: Decimal,
    pub decimals: u8,
    pub owner: Address,
}

#[derive(Clone, Debug)]
pub struct TokenContract {
    proxy: ContractProxy,
}

impl TokenContract {
    pub fn new(client: Arc<dyn LedgerClient>, address: Address, authority: Option<Address>) -> Self {
        Self {
            proxy: ContractProxy::new(client, address, authority),
        }
    }

    pub fn address(&self) -> Address {
        self.proxy.address()
    }

    pub async fn name(&self) -> Result<String, ContractError> {
        self.proxy.get_string("name", vec![]).await
    }

    pub async fn symbol(&self) -> Result<String, ContractError> {
        self.proxy.get_string("symbol", vec![]).await
    }

    /// Raw total supply in smallest units
    pub async fn total_supply(&self) -> Result<U256, ContractError> {
        self.proxy.get_uint("totalSupply", vec![]).await
    }

    pub async fn decimals(&self) -> Result<u8, ContractError> {
        let decimals = self.proxy.get_u64("decimals", vec![]).await?;
        u8::try_from(decimals).map_err(|_| ContractError::UnexpectedReturn {
            method: "decimals".to_string(),
            expected: "uint8",
        })
    }

    pub async fn owner(&self) -> Result<Address, ContractError> {
        self.proxy.get_address("owner", vec![]).await
    }

    /// DEX router fixed at deployment
    pub async fn router(&self) -> Result<Address, ContractError> {
        self.proxy.get_address("uniswapV2Router", vec![]).await
    }

    pub async fn treasury_address(&self) -> Result<Address, ContractError> {
        self.proxy.get_address("treasuryAddress", vec![]).await
    }

    /// Raw balance in smallest units
    pub async fn balance_of(&self, account: Address) -> Result<U256, ContractError> {
        self.proxy.get_uint("balanceOf", vec![Token::Address(account)]).await
    }

    pub async fn reflection_from_token(&self, amount: U256, deduct_transfer_fee: bool) -> Result<U256, ContractError> {
        self.proxy
            .get_uint(
                "reflectionFromToken",
                vec![Token::Uint(amount), Token::Bool(deduct_transfer_fee)],
            )
            .await
    }

    pub async fn fee_rate(&self, kind: FeeKind) -> Result<FeeRate, ContractError> {
        let (bps, apply_to_all) = tokio::try_join!(
            self.proxy.get_u64(kind.rate_getter(), vec![]),
            self.proxy.get_bool(kind.flag_getter(), vec![]),
        )?;
        let bps = u32::try_from(bps).map_err(|_| ContractError::UnexpectedReturn {
            method: kind.rate_getter().to_string(),
            expected: "basis points fitting in u32",
        })?;
        Ok(FeeRate { bps, apply_to_all })
    }

    /// All four rates and flags, read concurrently
    pub async fn fee_settings(&self) -> Result<FeeSettings, ContractError> {
        let (reflection, liquidity, treasury, burn) = tokio::try_join!(
            self.fee_rate(FeeKind::Reflection),
            self.fee_rate(FeeKind::Liquidity),
            self.fee_rate(FeeKind::Treasury),
            self.fee_rate(FeeKind::Burn),
        )?;
        Ok(FeeSettings {
            reflection,
            liquidity,
            treasury,
            burn,
        })
    }

    pub async fn fee_info(&self) -> Result<FeePercentages, ContractError> {
        Ok(self.fee_settings().await?.to_percentages())
    }

    pub async fn token_info(&self) -> Result<TokenInfo, ContractError> {
        let (name, symbol, total_supply, decimals, owner) = tokio::try_join!(
            self.name(),
            self.symbol(),
            self.total_supply(),
            self.decimals(),
            self.owner(),
        )?;

        Ok(TokenInfo {
            address: self.address(),
            name,
            symbol,
            total_supply: from_smallest_unit(total_supply, decimals as u32)?,
            decimals,
            owner,
        })
    }

    /// Balance in whole tokens plus its reflection value
    pub async fn owner_balance(&self, account: Address) -> Result<OwnerBalance, ContractError> {
        let raw = self.balance_of(account).await?;
        let reflection = self.reflection_from_token(raw, false).await?;
        Ok(OwnerBalance {
            balance: from_smallest_unit(raw, TOKEN_DECIMALS)?,
            reflection,
        })
    }

    pub async fn total_fees(&self) -> Result<Decimal, ContractError> {
        let raw = self.proxy.get_uint("totalFees", vec![]).await?;
        Ok(from_smallest_unit(raw, TOKEN_DECIMALS)?)
    }

    pub async fn is_excluded_from_fee(&self, account: Address) -> Result<bool, ContractError> {
        self.proxy.get_bool("isExcludedFromFee", vec![Token::Address(account)]).await
    }

    pub async fn is_excluded_from_reward(&self, account: Address) -> Result<bool, ContractError> {
        self.proxy.get_bool("isExcludedFromReward", vec![Token::Address(account)]).await
    }

    /// Update the four rates; flags are left as they are
    pub async fn set_fees(&self, fees: &FeePercentages) -> Result<TxReceipt, ContractError> {
        let args = FeeKind::ALL
            .iter()
            .map(|kind| to_basis_points(fees.rate(*kind)).map(|bps| Token::Uint(U256::from(bps))))
            .collect::<Result<Vec<_>, _>>()?;

        let receipt = self.proxy.submit("setFeePercents", args).await?;
        tracing::info!(
            "Fees updated on {:?}: reflection {}%, liquidity {}%, treasury {}%, burn {}%",
            self.address(),
            fees.reflection,
            fees.liquidity,
            fees.treasury,
            fees.burn
        );
        Ok(receipt)
    }

    pub async fn set_treasury_address(&self, treasury: Address) -> Result<TxReceipt, ContractError> {
        let receipt = self
            .proxy
            .submit("setTreasuryAddress", vec![Token::Address(treasury)])
            .await?;
        tracing::info!("Treasury of {:?} set to {:?}", self.address(), treasury);
        Ok(receipt)
    }

    pub async fn set_swap_and_liquify(&self, enabled: bool) -> Result<TxReceipt, ContractError> {
        let receipt = self
            .proxy
            .submit("setSwapAndLiquifyEnabled", vec![Token::Bool(enabled)])
            .await?;
        tracing::info!(
            "Swap and liquify {} on {:?}",
            if enabled { "enabled" } else { "disabled" },
            self.address()
        );
        Ok(receipt)
    }

    pub async fn exclude_from_fee(&self, account: Address) -> Result<TxReceipt, ContractError> {
        let receipt = self.proxy.submit("excludeFromFee", vec![Token::Address(account)]).await?;
        tracing::info!("{:?} excluded from fees on {:?}", account, self.address());
        Ok(receipt)
    }

    pub async fn include_in_fee(&self, account: Address) -> Result<TxReceipt, ContractError> {
        let receipt = self.proxy.submit("includeInFee", vec![Token::Address(account)]).await?;
        tracing::info!("{:?} included in fees on {:?}", account, self.address());
        Ok(receipt)
    }

    /// Transfer whole tokens from the bound authority
    pub async fn transfer(&self, to: Address, amount: Decimal) -> Result<TxReceipt, ContractError> {
        let raw = token_amount(amount)?;
        let receipt = self
            .proxy
            .submit("transfer", vec![Token::Address(to), Token::Uint(raw)])
            .await?;
        tracing::info!("Transferred {} tokens to {:?}", amount, to);
        Ok(receipt)
    }

    pub async fn transfer_from(&self, from: Address, to: Address, amount: Decimal) -> Result<TxReceipt, ContractError> {
        let raw = token_amount(amount)?;
        let receipt = self
            .proxy
            .submit(
                "transferFrom",
                vec![Token::Address(from), Token::Address(to), Token::Uint(raw)],
            )
            .await?;
        tracing::info!("Transferred {} tokens from {:?} to {:?}", amount, from, to);
        Ok(receipt)
    }

    pub async fn swap_and_liquify(&self) -> Result<TxReceipt, ContractError> {
        let receipt = self.proxy.submit("swapAndLiquify", vec![]).await?;
        tracing::info!("Swap and liquify executed on {:?}", self.address());
        Ok(receipt)
    }
}
