//! Contract Proxy
//!
//! Binds one deployed contract to a ledger client and an optional authority.
//! Reads always hit the ledger; nothing is cached between calls.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::UnitError;
use crate::ports::{LedgerClient, LedgerError, TxReceipt};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Authority required for {method} on {contract:?}")]
    AuthorityRequired { contract: Address, method: String },

    #[error("Remote call {method} on {contract:?} failed: {source}")]
    RemoteCallFailed {
        contract: Address,
        method: String,
        #[source]
        source: LedgerError,
    },

    #[error("Unexpected return from {method}: expected {expected}")]
    UnexpectedReturn { method: String, expected: &'static str },

    #[error(transparent)]
    Unit(#[from] UnitError),
}

impl ContractError {
    /// Underlying ledger error, if the failure came from the ledger
    pub fn ledger_error(&self) -> Option<&LedgerError> {
        match self {
            ContractError::RemoteCallFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Typed call surface over one contract address
#[derive(Clone)]
pub struct ContractProxy {
    client: Arc<dyn LedgerClient>,
    address: Address,
    authority: Option<Address>,
}

impl std::fmt::Debug for ContractProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractProxy")
            .field("address", &self.address)
            .field("authority", &self.authority)
            .finish()
    }
}

impl ContractProxy {
    pub fn new(client: Arc<dyn LedgerClient>, address: Address, authority: Option<Address>) -> Self {
        Self {
            client,
            address,
            authority,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn authority(&self) -> Option<Address> {
        self.authority
    }

    pub fn client(&self) -> &Arc<dyn LedgerClient> {
        &self.client
    }

    /// Raw read returning every output token
    pub async fn read(&self, method: &str, args: Vec<Token>) -> Result<Vec<Token>, ContractError> {
        tracing::debug!("call {:?}.{}", self.address, method);
        self.client
            .call(self.address, method, args)
            .await
            .map_err(|e| self.remote_failure(method, e))
    }

    async fn read_one(&self, method: &str, args: Vec<Token>) -> Result<Token, ContractError> {
        self.read(method, args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ContractError::UnexpectedReturn {
                method: method.to_string(),
                expected: "at least one output",
            })
    }

    pub async fn get_string(&self, method: &str, args: Vec<Token>) -> Result<String, ContractError> {
        self.read_one(method, args)
            .await?
            .into_string()
            .ok_or_else(|| unexpected(method, "string"))
    }

    pub async fn get_uint(&self, method: &str, args: Vec<Token>) -> Result<U256, ContractError> {
        self.read_one(method, args)
            .await?
            .into_uint()
            .ok_or_else(|| unexpected(method, "uint"))
    }

    pub async fn get_u64(&self, method: &str, args: Vec<Token>) -> Result<u64, ContractError> {
        let value = self.get_uint(method, args).await?;
        if value > U256::from(u64::MAX) {
            return Err(unexpected(method, "uint fitting in u64"));
        }
        Ok(value.as_u64())
    }

    pub async fn get_bool(&self, method: &str, args: Vec<Token>) -> Result<bool, ContractError> {
        self.read_one(method, args)
            .await?
            .into_bool()
            .ok_or_else(|| unexpected(method, "bool"))
    }

    pub async fn get_address(&self, method: &str, args: Vec<Token>) -> Result<Address, ContractError> {
        self.read_one(method, args)
            .await?
            .into_address()
            .ok_or_else(|| unexpected(method, "address"))
    }

    pub async fn get_array(&self, method: &str, args: Vec<Token>) -> Result<Vec<Token>, ContractError> {
        self.read_one(method, args)
            .await?
            .into_array()
            .ok_or_else(|| unexpected(method, "array"))
    }

    /// Native balance held by this contract, in wei
    pub async fn native_balance(&self) -> Result<U256, ContractError> {
        self.client
            .balance_of(self.address)
            .await
            .map_err(|e| self.remote_failure("balance", e))
    }

    /// Submit a state-changing call and wait for finality
    pub async fn submit(&self, method: &str, args: Vec<Token>) -> Result<TxReceipt, ContractError> {
        self.submit_with_value(method, args, U256::zero()).await
    }

    pub async fn submit_with_value(
        &self,
        method: &str,
        args: Vec<Token>,
        value: U256,
    ) -> Result<TxReceipt, ContractError> {
        let signer = self.authority.ok_or_else(|| ContractError::AuthorityRequired {
            contract: self.address,
            method: method.to_string(),
        })?;

        let receipt = self
            .client
            .send(self.address, method, args, signer, value)
            .await
            .map_err(|e| self.remote_failure(method, e))?;

        tracing::debug!(
            "{:?}.{} finalized in block {} ({:?})",
            self.address,
            method,
            receipt.block_number,
            receipt.tx_hash
        );
        Ok(receipt)
    }

    fn remote_failure(&self, method: &str, source: LedgerError) -> ContractError {
        ContractError::RemoteCallFailed {
            contract: self.address,
            method: method.to_string(),
            source,
        }
    }
}

fn unexpected(method: &str, expected: &'static str) -> ContractError {
    ContractError::UnexpectedReturn {
        method: method.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockLedgerClient;
    use ethers::types::H256;

    fn contract() -> Address {
        Address::from_low_u64_be(0x1000)
    }

    #[tokio::test]
    async fn test_get_string_decodes_first_output() {
        let mut mock = MockLedgerClient::new();
        mock.expect_call()
            .times(1)
            .returning(|_, _, _| Ok(vec![Token::String("Reflection Token".to_string())]));

        let proxy = ContractProxy::new(Arc::new(mock), contract(), None);
        assert_eq!(proxy.get_string("name", vec![]).await.unwrap(), "Reflection Token");
    }

    #[tokio::test]
    async fn test_type_mismatch_is_unexpected_return() {
        let mut mock = MockLedgerClient::new();
        mock.expect_call()
            .returning(|_, _, _| Ok(vec![Token::Bool(true)]));

        let proxy = ContractProxy::new(Arc::new(mock), contract(), None);
        let err = proxy.get_address("owner", vec![]).await.unwrap_err();
        assert!(matches!(err, ContractError::UnexpectedReturn { expected: "address", .. }));
    }

    #[tokio::test]
    async fn test_empty_output_is_unexpected_return() {
        let mut mock = MockLedgerClient::new();
        mock.expect_call().returning(|_, _, _| Ok(vec![]));

        let proxy = ContractProxy::new(Arc::new(mock), contract(), None);
        assert!(matches!(
            proxy.get_uint("totalSupply", vec![]).await,
            Err(ContractError::UnexpectedReturn { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_surfaces_verbatim() {
        let mut mock = MockLedgerClient::new();
        mock.expect_call()
            .times(1)
            .returning(|_, _, _| Err(LedgerError::Transport("connection reset".to_string())));

        let proxy = ContractProxy::new(Arc::new(mock), contract(), None);
        let err = proxy.get_bool("_applyBurnFeeToAll", vec![]).await.unwrap_err();

        assert_eq!(
            err.ledger_error(),
            Some(&LedgerError::Transport("connection reset".to_string()))
        );
        assert!(err.to_string().contains("_applyBurnFeeToAll"));
    }

    #[tokio::test]
    async fn test_mutator_without_authority_never_reaches_ledger() {
        let mut mock = MockLedgerClient::new();
        mock.expect_send().times(0);

        let proxy = ContractProxy::new(Arc::new(mock), contract(), None);
        let err = proxy.submit("withdrawFee", vec![]).await.unwrap_err();

        assert!(matches!(err, ContractError::AuthorityRequired { ref method, .. } if method == "withdrawFee"));
    }

    #[tokio::test]
    async fn test_mutator_revert_is_not_retried() {
        let mut mock = MockLedgerClient::new();
        mock.expect_send()
            .times(1)
            .returning(|_, _, _, _, _| Err(LedgerError::Reverted("caller is not the owner".to_string())));

        let proxy = ContractProxy::new(Arc::new(mock), contract(), Some(Address::from_low_u64_be(7)));
        let err = proxy.submit("setFee", vec![Token::Uint(U256::one())]).await.unwrap_err();

        assert!(err.ledger_error().map(|e| e.is_revert()).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_mutator_returns_receipt() {
        let mut mock = MockLedgerClient::new();
        mock.expect_send().times(1).returning(|_, _, _, _, _| {
            Ok(TxReceipt {
                tx_hash: H256::from_low_u64_be(42),
                block_number: 5,
            })
        });

        let proxy = ContractProxy::new(Arc::new(mock), contract(), Some(Address::from_low_u64_be(7)));
        let receipt = tokio_test::assert_ok!(proxy.submit("withdrawFee", vec![]).await);
        assert_eq!(receipt.block_number, 5);
    }
}
