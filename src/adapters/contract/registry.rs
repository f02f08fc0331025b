//! Registry Contract Adapter
//!
//! Typed surface of the shared `FeeReceiver` registry: service fee management,
//! paginated token listings and the membership scan.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::proxy::{ContractError, ContractProxy};
use crate::domain::units::{format_native, native_amount};
use crate::domain::{RegistryEntry, RegistrySummary, Verification};
use crate::ports::{LedgerClient, TxReceipt};

#[derive(Clone, Debug)]
pub struct RegistryContract {
    proxy: ContractProxy,
}

impl RegistryContract {
    pub fn new(client: Arc<dyn LedgerClient>, address: Address, authority: Option<Address>) -> Self {
        Self {
            proxy: ContractProxy::new(client, address, authority),
        }
    }

    pub fn address(&self) -> Address {
        self.proxy.address()
    }

    /// Current service fee in ETH
    pub async fn service_fee(&self) -> Result<Decimal, ContractError> {
        let wei = self.proxy.get_uint("serviceFee", vec![]).await?;
        Ok(format_native(wei)?)
    }

    pub async fn set_service_fee(&self, fee_eth: Decimal) -> Result<TxReceipt, ContractError> {
        let wei = native_amount(fee_eth)?;
        let receipt = self.proxy.submit("setFee", vec![Token::Uint(wei)]).await?;
        tracing::info!("Service fee updated to {} ETH", fee_eth);
        Ok(receipt)
    }

    pub async fn token_count(&self) -> Result<u64, ContractError> {
        self.proxy.get_u64("getTokenListLength", vec![]).await
    }

    pub async fn user_token_count(&self, owner: Address) -> Result<u64, ContractError> {
        self.proxy
            .get_u64("getUserTokenListLength", vec![Token::Address(owner)])
            .await
    }

    /// At most `page_size` entries starting at `cursor`, oldest first
    pub async fn list_tokens(&self, page_size: u64, cursor: u64) -> Result<Vec<RegistryEntry>, ContractError> {
        let raw = self
            .proxy
            .get_array("getTokenList", vec![uint(page_size), uint(cursor)])
            .await?;
        decode_page("getTokenList", raw, page_size)
    }

    pub async fn list_user_tokens(
        &self,
        owner: Address,
        page_size: u64,
        cursor: u64,
    ) -> Result<Vec<RegistryEntry>, ContractError> {
        let raw = self
            .proxy
            .get_array(
                "getUserTokenList",
                vec![Token::Address(owner), uint(page_size), uint(cursor)],
            )
            .await?;
        decode_page("getUserTokenList", raw, page_size)
    }

    /// Walk pages until a short page comes back or `token_count()` entries
    /// have been read
    pub async fn list_all_tokens(&self, page_size: u64) -> Result<Vec<RegistryEntry>, ContractError> {
        let page_size = page_size.max(1);
        let total = usize::try_from(self.token_count().await?).unwrap_or(usize::MAX);
        let mut entries = Vec::new();
        let mut cursor = 0u64;

        while entries.len() < total {
            let page = self.list_tokens(page_size, cursor).await?;
            let fetched = page.len() as u64;
            entries.extend(page);
            if fetched < page_size {
                break;
            }
            cursor += fetched;
        }

        entries.truncate(total);
        Ok(entries)
    }

    /// Linear membership scan, one entry per call
    ///
    /// Costs one `getTokenListLength` read plus up to one page read per
    /// registered token. Fine while the registry stays small; a larger page
    /// size would cut round trips but is not a drop-in replacement.
    pub async fn verify(&self, token: Address) -> Result<Verification, ContractError> {
        let total = self.token_count().await?;

        for cursor in 0..total {
            let page = self.list_tokens(1, cursor).await?;
            if let Some(entry) = page.into_iter().next() {
                if entry.address == token {
                    tracing::debug!("{:?} found in registry at index {}", token, cursor);
                    return Ok(Verification::found(entry));
                }
            }
        }

        tracing::debug!("{:?} not found among {} registered tokens", token, total);
        Ok(Verification::not_found())
    }

    pub async fn add_token(&self, created_at: u64, token: Address, owner: Address) -> Result<TxReceipt, ContractError> {
        let receipt = self
            .proxy
            .submit(
                "addToken",
                vec![uint(created_at), Token::Address(token), Token::Address(owner)],
            )
            .await?;
        tracing::info!("Token added to registry: {:?}", token);
        Ok(receipt)
    }

    pub async fn toggle_token_status(&self, id: u64) -> Result<TxReceipt, ContractError> {
        let receipt = self.proxy.submit("toggleTokenStatus", vec![uint(id)]).await?;
        tracing::info!("Token status toggled for id {}", id);
        Ok(receipt)
    }

    /// Native balance of the registry, in ETH
    pub async fn balance(&self) -> Result<Decimal, ContractError> {
        let wei = self.proxy.native_balance().await?;
        Ok(format_native(wei)?)
    }

    pub async fn withdraw_fees(&self) -> Result<TxReceipt, ContractError> {
        let receipt = self.proxy.submit("withdrawFee", vec![]).await?;
        tracing::info!("Fees withdrawn from registry {:?}", self.address());
        Ok(receipt)
    }

    pub async fn withdraw_unrecoverable_asset(&self, asset: Address) -> Result<TxReceipt, ContractError> {
        let receipt = self
            .proxy
            .submit("withdrawUnrecoverableAsset", vec![Token::Address(asset)])
            .await?;
        tracing::info!("Unrecoverable asset withdrawn: {:?}", asset);
        Ok(receipt)
    }

    /// Count, service fee and balance, read concurrently
    pub async fn summary(&self) -> Result<RegistrySummary, ContractError> {
        let (total_tokens, service_fee, balance) =
            tokio::try_join!(self.token_count(), self.service_fee(), self.balance())?;
        Ok(RegistrySummary::new(total_tokens, service_fee, balance)?)
    }
}

fn uint(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

fn decode_page(method: &str, raw: Vec<Token>, page_size: u64) -> Result<Vec<RegistryEntry>, ContractError> {
    let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
    raw.into_iter()
        .take(limit)
        .map(|token| decode_entry(method, token))
        .collect()
}

/// `(uint256 createdAt, address addr, address creator, bool enabled)`
fn decode_entry(method: &str, token: Token) -> Result<RegistryEntry, ContractError> {
    let bad = || ContractError::UnexpectedReturn {
        method: method.to_string(),
        expected: "(uint256,address,address,bool)",
    };

    let mut fields = token.into_tuple().ok_or_else(bad)?.into_iter();
    let created_at = fields.next().and_then(Token::into_uint).ok_or_else(bad)?;
    let address = fields.next().and_then(Token::into_address).ok_or_else(bad)?;
    let creator = fields.next().and_then(Token::into_address).ok_or_else(bad)?;
    let enabled = fields.next().and_then(Token::into_bool).ok_or_else(bad)?;

    if created_at > U256::from(u64::MAX) {
        return Err(bad());
    }

    Ok(RegistryEntry {
        created_at: created_at.as_u64(),
        address,
        creator,
        enabled,
    })
}

/// Encode an entry the way the registry returns it
pub fn encode_entry(entry: &RegistryEntry) -> Token {
    Token::Tuple(vec![
        uint(entry.created_at),
        Token::Address(entry.address),
        Token::Address(entry.creator),
        Token::Bool(entry.enabled),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockLedgerClient;

    fn entry(n: u64) -> RegistryEntry {
        RegistryEntry {
            created_at: 1_700_000_000 + n,
            address: Address::from_low_u64_be(0x2000 + n),
            creator: Address::from_low_u64_be(0x99),
            enabled: true,
        }
    }

    #[test]
    fn test_entry_codec() {
        let original = entry(3);
        let decoded = decode_entry("getTokenList", encode_entry(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_malformed_entry() {
        let token = Token::Tuple(vec![Token::Bool(true)]);
        assert!(matches!(
            decode_entry("getTokenList", token),
            Err(ContractError::UnexpectedReturn { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_tokens_caps_oversized_page() {
        // A misbehaving registry returning more than requested
        let mut mock = MockLedgerClient::new();
        mock.expect_call().returning(|_, _, _| {
            let page = (0..8).map(|n| encode_entry(&entry(n))).collect();
            Ok(vec![Token::Array(page)])
        });

        let registry = RegistryContract::new(Arc::new(mock), Address::from_low_u64_be(1), None);
        let page = registry.list_tokens(5, 0).await.unwrap();

        assert_eq!(page.len(), 5);
        assert_eq!(page[0], entry(0));
        assert_eq!(page[4], entry(4));
    }

    #[tokio::test]
    async fn test_list_all_tokens_bounded_by_count() {
        // A registry that ignores the cursor and always returns a full page
        let mut mock = MockLedgerClient::new();
        mock.expect_call().times(3).returning(|_, method, _| match method {
            "getTokenListLength" => Ok(vec![Token::Uint(U256::from(4))]),
            _ => {
                let page = (0..3).map(|n| encode_entry(&entry(n))).collect();
                Ok(vec![Token::Array(page)])
            }
        });

        let registry = RegistryContract::new(Arc::new(mock), Address::from_low_u64_be(1), None);
        let all = registry.list_all_tokens(3).await.unwrap();

        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_service_fee_formats_wei() {
        let mut mock = MockLedgerClient::new();
        mock.expect_call().returning(|_, _, _| {
            Ok(vec![Token::Uint(U256::from(200_000_000_000_000_000u64))])
        });

        let registry = RegistryContract::new(Arc::new(mock), Address::from_low_u64_be(1), None);
        assert_eq!(registry.service_fee().await.unwrap(), rust_decimal_macros::dec!(0.2));
    }

    #[tokio::test]
    async fn test_set_service_fee_requires_authority() {
        let mock = MockLedgerClient::new();
        let registry = RegistryContract::new(Arc::new(mock), Address::from_low_u64_be(1), None);

        let err = registry.set_service_fee(rust_decimal_macros::dec!(0.3)).await.unwrap_err();
        assert!(matches!(err, ContractError::AuthorityRequired { .. }));
    }
}
