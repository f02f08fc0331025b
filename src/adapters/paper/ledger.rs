//! Paper Ledger
//!
//! An in-process `LedgerClient` for dry runs and tests. Deployments get
//! deterministic addresses, every call is recorded, and failures can be
//! injected per method occurrence.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, H256, U256};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::state::{registry_send, Args, RegistryState, TokenState};
use crate::domain::{REGISTRY_ARTIFACT, TOKEN_ARTIFACT};
use crate::ports::{LedgerClient, LedgerError, TxReceipt};

/// First address handed out to deployed contracts
const CONTRACT_ADDRESS_BASE: u64 = 0xC0DE_0000;

/// Kind of ledger interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    Send,
    Deploy,
    Balance,
}

/// One recorded interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Method name, or artifact name for deployments
    pub method: String,
    pub contract: Option<Address>,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    method: String,
    /// 1-based occurrence of `method` that fails
    occurrence: usize,
    error: LedgerError,
}

#[derive(Debug, Default)]
struct PaperState {
    deployed: u64,
    block_number: u64,
    created_at_override: Option<u64>,
    native: HashMap<Address, U256>,
    registries: HashMap<Address, RegistryState>,
    tokens: HashMap<Address, TokenState>,
    calls: Vec<RecordedCall>,
    failures: Vec<InjectedFailure>,
}

impl PaperState {
    /// Record the interaction and return the injected failure for it, if any
    fn record(&mut self, kind: CallKind, method: &str, contract: Option<Address>) -> Result<(), LedgerError> {
        self.calls.push(RecordedCall {
            kind,
            method: method.to_string(),
            contract,
        });

        let occurrence = self.calls.iter().filter(|c| c.method == method).count();
        match self
            .failures
            .iter()
            .find(|f| f.method == method && f.occurrence == occurrence)
        {
            Some(failure) => {
                warn!("Paper ledger: injected failure on {} #{}", method, occurrence);
                Err(failure.error.clone())
            }
            None => Ok(()),
        }
    }

    fn next_receipt(&mut self) -> TxReceipt {
        self.block_number += 1;
        TxReceipt {
            tx_hash: H256::from_low_u64_be(self.block_number),
            block_number: self.block_number,
        }
    }

    fn next_address(&mut self) -> Address {
        self.deployed += 1;
        Address::from_low_u64_be(CONTRACT_ADDRESS_BASE + self.deployed)
    }

    fn now(&self) -> u64 {
        self.created_at_override
            .unwrap_or_else(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default())
    }
}

/// Simulated ledger holding every contract in memory
#[derive(Debug, Default)]
pub struct PaperLedger {
    state: Mutex<PaperState>,
}

impl PaperLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `occurrence`-th (1-based) interaction named `method`
    ///
    /// Deployments are named after their artifact, e.g. `"RexasErc20"`.
    pub fn with_failure(mut self, method: &str, occurrence: usize, error: LedgerError) -> Self {
        self.state.get_mut().failures.push(InjectedFailure {
            method: method.to_string(),
            occurrence,
            error,
        });
        self
    }

    /// Use a fixed registration timestamp instead of the wall clock
    pub fn with_fixed_time(mut self, created_at: u64) -> Self {
        self.state.get_mut().created_at_override = Some(created_at);
        self
    }

    pub async fn inject_failure(&self, method: &str, occurrence: usize, error: LedgerError) {
        self.state.lock().await.failures.push(InjectedFailure {
            method: method.to_string(),
            occurrence,
            error,
        });
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub async fn clear_recorded_calls(&self) {
        self.state.lock().await.calls.clear();
    }
}

#[async_trait]
impl LedgerClient for PaperLedger {
    async fn call(&self, contract: Address, method: &str, args: Vec<Token>) -> Result<Vec<Token>, LedgerError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::Call, method, Some(contract))?;

        let args = Args::new(method, args);
        if let Some(registry) = state.registries.get(&contract) {
            return registry.call(method, args);
        }
        if let Some(token) = state.tokens.get(&contract) {
            return token.call(method, args);
        }
        Err(LedgerError::UnknownContract(format!("{:?}", contract)))
    }

    async fn send(
        &self,
        contract: Address,
        method: &str,
        args: Vec<Token>,
        signer: Address,
        value: U256,
    ) -> Result<TxReceipt, LedgerError> {
        let mut guard = self.state.lock().await;
        guard.record(CallKind::Send, method, Some(contract))?;

        if !value.is_zero() {
            return Err(LedgerError::Reverted(format!("{} is not payable", method)));
        }

        let args = Args::new(method, args);
        let state = &mut *guard;
        if let Some(registry) = state.registries.get_mut(&contract) {
            registry_send(
                contract,
                registry,
                &mut state.native,
                &mut state.tokens,
                method,
                args,
                signer,
            )?;
        } else if let Some(token) = state.tokens.get_mut(&contract) {
            token.send(method, args, signer)?;
        } else {
            return Err(LedgerError::UnknownContract(format!("{:?}", contract)));
        }

        let receipt = state.next_receipt();
        debug!("Paper ledger: {:?}.{} mined in block {}", contract, method, receipt.block_number);
        Ok(receipt)
    }

    async fn deploy(
        &self,
        artifact: &str,
        args: Vec<Token>,
        signer: Address,
        value: U256,
    ) -> Result<Address, LedgerError> {
        let mut guard = self.state.lock().await;
        guard.record(CallKind::Deploy, artifact, None)?;
        let state = &mut *guard;

        let address = match artifact {
            REGISTRY_ARTIFACT => {
                if !value.is_zero() {
                    return Err(LedgerError::Reverted("FeeReceiver constructor is not payable".to_string()));
                }
                let registry = RegistryState::new(signer)?;
                let address = state.next_address();
                state.registries.insert(address, registry);
                address
            }
            TOKEN_ARTIFACT => {
                // Validate everything before consuming an address
                let provisional = Address::from_low_u64_be(CONTRACT_ADDRESS_BASE + state.deployed + 1);
                let token = TokenState::from_constructor(provisional, signer, Args::new(artifact, args))?;
                let created_at = state.now();
                let registry = state
                    .registries
                    .get_mut(&token.registry)
                    .ok_or_else(|| LedgerError::Reverted("RexasErc20: invalid fee receiver".to_string()))?;
                if value < registry.service_fee {
                    return Err(LedgerError::Reverted("RexasErc20: insufficient service fee".to_string()));
                }

                registry.register(created_at, provisional, signer);
                *state.native.entry(token.registry).or_default() += value;

                let address = state.next_address();
                state.tokens.insert(address, token);
                address
            }
            other => return Err(LedgerError::UnknownContract(other.to_string())),
        };

        let receipt = state.next_receipt();
        info!("Paper ledger: {} deployed at {:?} (block {})", artifact, address, receipt.block_number);
        Ok(address)
    }

    async fn balance_of(&self, account: Address) -> Result<U256, LedgerError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::Balance, "balance", Some(account))?;
        Ok(state.native.get(&account).copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::contract::{RegistryContract, TokenContract};
    use crate::domain::{FeePercentages, FeeSettings};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn deployer() -> Address {
        Address::from_low_u64_be(0xD1)
    }

    async fn deploy_registry(ledger: &PaperLedger) -> Address {
        ledger
            .deploy(REGISTRY_ARTIFACT, vec![], deployer(), U256::zero())
            .await
            .unwrap()
    }

    fn token_args(registry: Address) -> Vec<Token> {
        let fees = FeeSettings::from_percentages(&FeePercentages::new(dec!(2), dec!(3), dec!(1), dec!(0.5), false)).unwrap();
        vec![
            Token::String("Paper".to_string()),
            Token::String("PPR".to_string()),
            Token::Uint(U256::from(1_000_000_000_000u64)),
            Token::Address(Address::from_low_u64_be(0xAA)),
            Token::Address(deployer()),
            fees.to_abi(),
            Token::Address(registry),
        ]
    }

    fn service_fee() -> U256 {
        U256::from(200_000_000_000_000_000u64)
    }

    #[tokio::test]
    async fn test_token_deploy_registers_and_pays_fee() {
        let ledger = PaperLedger::new().with_fixed_time(1_700_000_000);
        let registry = deploy_registry(&ledger).await;

        let token = ledger
            .deploy(TOKEN_ARTIFACT, token_args(registry), deployer(), service_fee())
            .await
            .unwrap();

        assert_eq!(ledger.balance_of(registry).await.unwrap(), service_fee());

        let entries = ledger
            .call(registry, "getTokenList", vec![Token::Uint(U256::from(10)), Token::Uint(U256::zero())])
            .await
            .unwrap();
        let page = entries[0].clone().into_array().unwrap();
        assert_eq!(page.len(), 1);
        let fields = page[0].clone().into_tuple().unwrap();
        assert_eq!(fields[0], Token::Uint(U256::from(1_700_000_000u64)));
        assert_eq!(fields[1], Token::Address(token));
        assert_eq!(fields[2], Token::Address(deployer()));
    }

    #[tokio::test]
    async fn test_token_deploy_requires_service_fee() {
        let ledger = PaperLedger::new();
        let registry = deploy_registry(&ledger).await;

        let err = ledger
            .deploy(TOKEN_ARTIFACT, token_args(registry), deployer(), U256::one())
            .await
            .unwrap_err();
        assert!(err.is_revert());
        assert_eq!(ledger.balance_of(registry).await.unwrap(), U256::zero());
    }

    #[tokio::test]
    async fn test_token_deploy_requires_known_registry() {
        let ledger = PaperLedger::new();
        let err = ledger
            .deploy(TOKEN_ARTIFACT, token_args(Address::from_low_u64_be(5)), deployer(), service_fee())
            .await
            .unwrap_err();
        assert!(err.is_revert());
    }

    #[tokio::test]
    async fn test_injected_failure_hits_exact_occurrence() {
        let ledger = PaperLedger::new()
            .with_failure("serviceFee", 2, LedgerError::Transport("timeout".to_string()));
        let registry = deploy_registry(&ledger).await;

        assert!(ledger.call(registry, "serviceFee", vec![]).await.is_ok());
        assert_eq!(
            ledger.call(registry, "serviceFee", vec![]).await,
            Err(LedgerError::Transport("timeout".to_string()))
        );
        assert!(ledger.call(registry, "serviceFee", vec![]).await.is_ok());
        assert_eq!(ledger.call_count("serviceFee").await, 3);
    }

    #[tokio::test]
    async fn test_unknown_contract() {
        let ledger = PaperLedger::new();
        assert!(matches!(
            ledger.call(Address::from_low_u64_be(1), "name", vec![]).await,
            Err(LedgerError::UnknownContract(_))
        ));
    }

    #[tokio::test]
    async fn test_token_management_through_adapter() {
        let ledger = Arc::new(PaperLedger::new());
        let registry = deploy_registry(&ledger).await;
        let address = ledger
            .deploy(TOKEN_ARTIFACT, token_args(registry), deployer(), service_fee())
            .await
            .unwrap();

        let token = TokenContract::new(ledger.clone(), address, Some(deployer()));
        let holder = Address::from_low_u64_be(0xBEEF);

        token.transfer(holder, dec!(250.5)).await.unwrap();
        assert_eq!(token.owner_balance(holder).await.unwrap().balance, dec!(250.5));

        token.exclude_from_fee(holder).await.unwrap();
        assert!(token.is_excluded_from_fee(holder).await.unwrap());
        token.include_in_fee(holder).await.unwrap();
        assert!(!token.is_excluded_from_fee(holder).await.unwrap());

        token
            .set_fees(&FeePercentages::new(dec!(1), dec!(1), dec!(1), dec!(1), false))
            .await
            .unwrap();
        assert_eq!(token.fee_settings().await.unwrap().total_bps(), 400);

        let outsider = TokenContract::new(ledger.clone(), address, Some(holder));
        let err = outsider.swap_and_liquify().await.unwrap_err();
        assert!(err.ledger_error().map(|e| e.is_revert()).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_registry_withdraw_moves_balance_to_owner() {
        let ledger = Arc::new(PaperLedger::new());
        let address = deploy_registry(&ledger).await;
        ledger
            .deploy(TOKEN_ARTIFACT, token_args(address), deployer(), service_fee())
            .await
            .unwrap();

        let registry = RegistryContract::new(ledger.clone(), address, Some(deployer()));
        assert_eq!(registry.balance().await.unwrap(), dec!(0.2));

        registry.withdraw_fees().await.unwrap();
        assert_eq!(registry.balance().await.unwrap(), dec!(0));
        assert_eq!(ledger.balance_of(deployer()).await.unwrap(), service_fee());
    }
}
