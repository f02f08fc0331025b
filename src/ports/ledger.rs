//! Ledger Port
//!
//! The single seam between this crate and the remote ledger. Implementations
//! own transport, signing and confirmation; callers only see ABI tokens in and
//! out.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Could not reach the ledger or the request was malformed in transit
    #[error("Transport error: {0}")]
    Transport(String),

    /// The call reached the contract and reverted
    #[error("Execution reverted: {0}")]
    Reverted(String),

    /// No contract or artifact known at the requested location
    #[error("Unknown contract: {0}")]
    UnknownContract(String),
}

impl LedgerError {
    pub fn is_revert(&self) -> bool {
        matches!(self, LedgerError::Reverted(_))
    }
}

/// Receipt of a finalized state-changing call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub block_number: u64,
}

/// Contract-call interface of the remote ledger
///
/// Every `send`/`deploy` returns only after the ledger finalized the
/// transaction; there is no pending state at this boundary.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Read-only call
    async fn call(&self, contract: Address, method: &str, args: Vec<Token>) -> Result<Vec<Token>, LedgerError>;

    /// State-changing call signed by `signer`, paying `value` wei
    async fn send(
        &self,
        contract: Address,
        method: &str,
        args: Vec<Token>,
        signer: Address,
        value: U256,
    ) -> Result<TxReceipt, LedgerError>;

    /// Deploy `artifact` with constructor `args`; returns the assigned address
    async fn deploy(
        &self,
        artifact: &str,
        args: Vec<Token>,
        signer: Address,
        value: U256,
    ) -> Result<Address, LedgerError>;

    /// Native balance of an account, in wei
    async fn balance_of(&self, account: Address) -> Result<U256, LedgerError>;
}
