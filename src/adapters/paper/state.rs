//! Paper Ledger State
//!
//! In-memory mirror of the registry and token contracts. Only bookkeeping is
//! simulated: transfers move balances without reflection, liquidity or burn
//! side effects.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use std::collections::{HashMap, HashSet};

use crate::adapters::contract::registry::encode_entry;
use crate::domain::units::{native_amount, TOKEN_DECIMALS};
use crate::domain::token::DEFAULT_SERVICE_FEE_ETH;
use crate::domain::{FeeKind, FeeRate, FeeSettings, RegistryEntry};
use crate::ports::LedgerError;

const BPS_DENOMINATOR: u64 = 10_000;

fn revert(reason: impl Into<String>) -> LedgerError {
    LedgerError::Reverted(reason.into())
}

/// Positional ABI argument reader
pub(crate) struct Args {
    method: String,
    tokens: std::vec::IntoIter<Token>,
}

impl Args {
    pub(crate) fn new(method: &str, tokens: Vec<Token>) -> Self {
        Self {
            method: method.to_string(),
            tokens: tokens.into_iter(),
        }
    }

    fn bad(&self, expected: &str) -> LedgerError {
        revert(format!("{}: expected {} argument", self.method, expected))
    }

    pub(crate) fn address(&mut self) -> Result<Address, LedgerError> {
        self.tokens.next().and_then(Token::into_address).ok_or_else(|| self.bad("address"))
    }

    pub(crate) fn uint(&mut self) -> Result<U256, LedgerError> {
        self.tokens.next().and_then(Token::into_uint).ok_or_else(|| self.bad("uint"))
    }

    pub(crate) fn index(&mut self) -> Result<usize, LedgerError> {
        let value = self.uint()?;
        if value > U256::from(usize::MAX) {
            return Err(self.bad("index-sized uint"));
        }
        Ok(value.as_usize())
    }

    pub(crate) fn boolean(&mut self) -> Result<bool, LedgerError> {
        self.tokens.next().and_then(Token::into_bool).ok_or_else(|| self.bad("bool"))
    }

    pub(crate) fn string(&mut self) -> Result<String, LedgerError> {
        self.tokens.next().and_then(Token::into_string).ok_or_else(|| self.bad("string"))
    }

    pub(crate) fn tuple(&mut self) -> Result<Vec<Token>, LedgerError> {
        self.tokens.next().and_then(Token::into_tuple).ok_or_else(|| self.bad("tuple"))
    }
}

fn page<T: Clone>(items: &[T], size: usize, cursor: usize) -> Vec<T> {
    if cursor >= items.len() {
        return Vec::new();
    }
    let end = cursor.saturating_add(size).min(items.len());
    items[cursor..end].to_vec()
}

#[derive(Debug, Clone)]
pub(crate) struct RegistryState {
    pub owner: Address,
    pub service_fee: U256,
    pub entries: Vec<RegistryEntry>,
}

impl RegistryState {
    pub fn new(owner: Address) -> Result<Self, LedgerError> {
        let service_fee = native_amount(DEFAULT_SERVICE_FEE_ETH)
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            owner,
            service_fee,
            entries: Vec::new(),
        })
    }

    fn only_owner(&self, signer: Address) -> Result<(), LedgerError> {
        if signer != self.owner {
            return Err(revert("Ownable: caller is not the owner"));
        }
        Ok(())
    }

    fn user_entries(&self, creator: Address) -> Vec<RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.creator == creator)
            .cloned()
            .collect()
    }

    pub fn call(&self, method: &str, mut args: Args) -> Result<Vec<Token>, LedgerError> {
        let encode = |entries: Vec<RegistryEntry>| {
            vec![Token::Array(entries.iter().map(encode_entry).collect())]
        };

        match method {
            "serviceFee" => Ok(vec![Token::Uint(self.service_fee)]),
            "owner" => Ok(vec![Token::Address(self.owner)]),
            "getTokenListLength" => Ok(vec![Token::Uint(U256::from(self.entries.len()))]),
            "getTokenList" => {
                let size = args.index()?;
                let cursor = args.index()?;
                Ok(encode(page(&self.entries, size, cursor)))
            }
            "getUserTokenListLength" => {
                let creator = args.address()?;
                Ok(vec![Token::Uint(U256::from(self.user_entries(creator).len()))])
            }
            "getUserTokenList" => {
                let creator = args.address()?;
                let size = args.index()?;
                let cursor = args.index()?;
                Ok(encode(page(&self.user_entries(creator), size, cursor)))
            }
            other => Err(revert(format!("FeeReceiver: unknown method {}", other))),
        }
    }

    pub fn register(&mut self, created_at: u64, token: Address, creator: Address) {
        self.entries.push(RegistryEntry {
            created_at,
            address: token,
            creator,
            enabled: true,
        });
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TokenState {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub owner: Address,
    pub router: Address,
    pub treasury: Address,
    pub registry: Address,
    pub fees: FeeSettings,
    pub balances: HashMap<Address, U256>,
    pub excluded_from_fee: HashSet<Address>,
    pub excluded_from_reward: HashSet<Address>,
    pub swap_and_liquify_enabled: bool,
    pub total_fees: U256,
}

impl TokenState {
    /// Decode `(name, symbol, supply, router, treasury, fees, registry)`
    pub fn from_constructor(
        self_address: Address,
        deployer: Address,
        mut args: Args,
    ) -> Result<Self, LedgerError> {
        let name = args.string()?;
        let symbol = args.string()?;
        let total_supply = args.uint()?;
        let router = args.address()?;
        let treasury = args.address()?;
        let fees = decode_fee_tuple(args.tuple()?)?;
        let registry = args.address()?;

        let mut balances = HashMap::new();
        balances.insert(deployer, total_supply);

        let excluded_from_fee = [deployer, self_address].into_iter().collect();

        Ok(Self {
            name,
            symbol,
            decimals: TOKEN_DECIMALS as u8,
            total_supply,
            owner: deployer,
            router,
            treasury,
            registry,
            fees,
            balances,
            excluded_from_fee,
            excluded_from_reward: HashSet::new(),
            swap_and_liquify_enabled: true,
            total_fees: U256::zero(),
        })
    }

    fn only_owner(&self, signer: Address) -> Result<(), LedgerError> {
        if signer != self.owner {
            return Err(revert("Ownable: caller is not the owner"));
        }
        Ok(())
    }

    fn balance(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.balance(&from);
        if available < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        self.balances.insert(from, available - amount);
        let credited = self.balance(&to) + amount;
        self.balances.insert(to, credited);
        Ok(())
    }

    /// Take `amount` out of `holder` entirely; used when sweeping stuck tokens
    pub fn sweep(&mut self, holder: Address, to: Address) -> U256 {
        let amount = self.balance(&holder);
        if !amount.is_zero() {
            self.balances.insert(holder, U256::zero());
            let credited = self.balance(&to) + amount;
            self.balances.insert(to, credited);
        }
        amount
    }

    pub fn call(&self, method: &str, mut args: Args) -> Result<Vec<Token>, LedgerError> {
        let value = match method {
            "name" => Token::String(self.name.clone()),
            "symbol" => Token::String(self.symbol.clone()),
            "decimals" => Token::Uint(U256::from(self.decimals)),
            "totalSupply" => Token::Uint(self.total_supply),
            "owner" => Token::Address(self.owner),
            "uniswapV2Router" => Token::Address(self.router),
            "treasuryAddress" => Token::Address(self.treasury),
            "totalFees" => Token::Uint(self.total_fees),
            "balanceOf" => Token::Uint(self.balance(&args.address()?)),
            "isExcludedFromFee" => Token::Bool(self.excluded_from_fee.contains(&args.address()?)),
            "isExcludedFromReward" => Token::Bool(self.excluded_from_reward.contains(&args.address()?)),
            "reflectionFromToken" => {
                let amount = args.uint()?;
                let deduct_fee = args.boolean()?;
                if amount > self.total_supply {
                    return Err(revert("Amount must be less than supply"));
                }
                if deduct_fee {
                    let fee = amount * U256::from(self.fees.total_bps()) / U256::from(BPS_DENOMINATOR);
                    Token::Uint(amount.saturating_sub(fee))
                } else {
                    Token::Uint(amount)
                }
            }
            getter => {
                let kind = FeeKind::ALL
                    .iter()
                    .find(|k| k.rate_getter() == getter || k.flag_getter() == getter)
                    .ok_or_else(|| revert(format!("RexasErc20: unknown method {}", getter)))?;
                let rate = self.fees.rate(*kind);
                if kind.rate_getter() == getter {
                    Token::Uint(U256::from(rate.bps))
                } else {
                    Token::Bool(rate.apply_to_all)
                }
            }
        };
        Ok(vec![value])
    }

    pub fn send(&mut self, method: &str, mut args: Args, signer: Address) -> Result<(), LedgerError> {
        match method {
            "setFeePercents" => {
                self.only_owner(signer)?;
                for kind in FeeKind::ALL {
                    let bps = args.uint()?;
                    if bps > U256::from(BPS_DENOMINATOR) {
                        return Err(revert("Fee exceeds 100%"));
                    }
                    self.fees.rate_mut(kind).bps = bps.as_u32();
                }
            }
            "setTreasuryAddress" => {
                self.only_owner(signer)?;
                self.treasury = args.address()?;
            }
            "setSwapAndLiquifyEnabled" => {
                self.only_owner(signer)?;
                self.swap_and_liquify_enabled = args.boolean()?;
            }
            "excludeFromFee" => {
                self.only_owner(signer)?;
                self.excluded_from_fee.insert(args.address()?);
            }
            "includeInFee" => {
                self.only_owner(signer)?;
                let account = args.address()?;
                self.excluded_from_fee.remove(&account);
            }
            "transfer" => {
                let to = args.address()?;
                let amount = args.uint()?;
                self.move_balance(signer, to, amount)?;
            }
            "transferFrom" => {
                let from = args.address()?;
                let to = args.address()?;
                let amount = args.uint()?;
                if from != signer {
                    return Err(revert("ERC20: insufficient allowance"));
                }
                self.move_balance(from, to, amount)?;
            }
            "swapAndLiquify" => {
                self.only_owner(signer)?;
                if !self.swap_and_liquify_enabled {
                    return Err(revert("Swap and liquify disabled"));
                }
            }
            other => return Err(revert(format!("RexasErc20: unknown method {}", other))),
        }
        Ok(())
    }
}

/// Owner-only registry mutations that need access to native and token balances
pub(crate) fn registry_send(
    registry_address: Address,
    registry: &mut RegistryState,
    native: &mut HashMap<Address, U256>,
    tokens: &mut HashMap<Address, TokenState>,
    method: &str,
    mut args: Args,
    signer: Address,
) -> Result<(), LedgerError> {
    registry.only_owner(signer)?;

    match method {
        "setFee" => {
            registry.service_fee = args.uint()?;
        }
        "addToken" => {
            let created_at = args.uint()?;
            let token = args.address()?;
            let owner = args.address()?;
            if created_at > U256::from(u64::MAX) {
                return Err(revert("addToken: createdAt out of range"));
            }
            registry.register(created_at.as_u64(), token, owner);
        }
        "toggleTokenStatus" => {
            let id = args.index()?;
            let entry = registry
                .entries
                .get_mut(id)
                .ok_or_else(|| revert("toggleTokenStatus: invalid id"))?;
            entry.enabled = !entry.enabled;
        }
        "withdrawFee" => {
            let amount = native.remove(&registry_address).unwrap_or_default();
            if amount.is_zero() {
                return Err(revert("Nothing to withdraw"));
            }
            *native.entry(registry.owner).or_default() += amount;
        }
        "withdrawUnrecoverableAsset" => {
            let asset = args.address()?;
            let token = tokens
                .get_mut(&asset)
                .ok_or_else(|| revert("withdrawUnrecoverableAsset: unknown asset"))?;
            if token.sweep(registry_address, registry.owner).is_zero() {
                return Err(revert("Nothing to withdraw"));
            }
        }
        other => return Err(revert(format!("FeeReceiver: unknown method {}", other))),
    }
    Ok(())
}

fn decode_fee_tuple(fields: Vec<Token>) -> Result<FeeSettings, LedgerError> {
    let bad = || revert("RexasErc20: malformed fee settings");
    if fields.len() != FeeKind::ALL.len() * 2 {
        return Err(bad());
    }

    let mut settings = FeeSettings::default();
    let mut fields = fields.into_iter();
    for kind in FeeKind::ALL {
        let bps = fields.next().and_then(Token::into_uint).ok_or_else(bad)?;
        let apply_to_all = fields.next().and_then(Token::into_bool).ok_or_else(bad)?;
        if bps > U256::from(BPS_DENOMINATOR) {
            return Err(revert("Fee exceeds 100%"));
        }
        *settings.rate_mut(kind) = FeeRate {
            bps: bps.as_u32(),
            apply_to_all,
        };
    }
    Ok(settings)
}
