//! Analytics Report Types
//!
//! Pure reduction of registry and per-token reads into a summary report.
//! Reading is done by `application::analytics`; nothing here touches the ledger.

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use super::fees::{FeeKind, FeePercentages};
use super::units::UnitError;

/// Registry-level figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub total_tokens: u64,
    /// Current service fee (ETH)
    pub service_fee: Decimal,
    /// Registry contract balance (ETH)
    pub contract_balance: Decimal,
    /// `contract_balance + service_fee * total_tokens`
    pub total_value_collected: Decimal,
}

impl RegistrySummary {
    pub fn new(total_tokens: u64, service_fee: Decimal, contract_balance: Decimal) -> Result<Self, UnitError> {
        let total_value_collected = service_fee
            .checked_mul(Decimal::from(total_tokens))
            .and_then(|fees| fees.checked_add(contract_balance))
            .ok_or_else(|| {
                UnitError::OutOfRange(format!(
                    "{} + {} * {} overflows a decimal",
                    contract_balance, service_fee, total_tokens
                ))
            })?;
        Ok(Self {
            total_tokens,
            service_fee,
            contract_balance,
            total_value_collected,
        })
    }
}

/// Owner balance as reported by the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerBalance {
    /// Whole tokens
    pub balance: Decimal,
    /// Raw `reflectionFromToken(balance, false)`
    pub reflection: U256,
}

/// Per-token snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAnalytics {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// Whole tokens
    pub total_supply: Decimal,
    pub decimals: u8,
    pub owner: Address,
    pub fees: FeePercentages,
    pub owner_balance: OwnerBalance,
}

/// Average fee per dimension, in percent
///
/// `None` when no token contributed to the average.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AverageFees {
    pub reflection: Option<Decimal>,
    pub liquidity: Option<Decimal>,
    pub treasury: Option<Decimal>,
    pub burn: Option<Decimal>,
}

impl AverageFees {
    pub fn from_tokens(tokens: &[TokenAnalytics]) -> Self {
        let average = |kind: FeeKind| -> Option<Decimal> {
            if tokens.is_empty() {
                return None;
            }
            let sum: Decimal = tokens.iter().map(|t| t.fees.rate(kind)).sum();
            Some((sum / Decimal::from(tokens.len())).normalize())
        };

        Self {
            reflection: average(FeeKind::Reflection),
            liquidity: average(FeeKind::Liquidity),
            treasury: average(FeeKind::Treasury),
            burn: average(FeeKind::Burn),
        }
    }

    pub fn get(&self, kind: FeeKind) -> Option<Decimal> {
        match kind {
            FeeKind::Reflection => self.reflection,
            FeeKind::Liquidity => self.liquidity,
            FeeKind::Treasury => self.treasury,
            FeeKind::Burn => self.burn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_tokens_deployed: usize,
    pub total_value_collected: Decimal,
    pub average_fees: AverageFees,
}

/// Full analytics report, recomputed on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    pub registry: RegistrySummary,
    /// In deployment order
    pub tokens: Vec<TokenAnalytics>,
    pub summary: ReportSummary,
}

impl AnalyticsReport {
    pub fn new(registry: RegistrySummary, tokens: Vec<TokenAnalytics>) -> Self {
        let summary = ReportSummary {
            total_tokens_deployed: tokens.len(),
            total_value_collected: registry.total_value_collected,
            average_fees: AverageFees::from_tokens(&tokens),
        };
        Self {
            registry,
            tokens,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn token_with_fees(reflection: Decimal, burn: Decimal) -> TokenAnalytics {
        TokenAnalytics {
            address: Address::from_low_u64_be(0xabc),
            name: "T".to_string(),
            symbol: "T".to_string(),
            total_supply: dec!(1000),
            decimals: 9,
            owner: Address::zero(),
            fees: FeePercentages::new(reflection, dec!(1), dec!(1), burn, false),
            owner_balance: OwnerBalance {
                balance: dec!(1000),
                reflection: U256::zero(),
            },
        }
    }

    #[test]
    fn test_total_value_collected() {
        let summary = RegistrySummary::new(3, dec!(0.2), dec!(0.1)).unwrap();
        assert_eq!(summary.total_value_collected, dec!(0.7));
    }

    #[test]
    fn test_total_value_collected_empty_registry() {
        let summary = RegistrySummary::new(0, dec!(0.2), dec!(0)).unwrap();
        assert_eq!(summary.total_value_collected, dec!(0));
    }

    #[test]
    fn test_total_value_collected_overflow() {
        let err = RegistrySummary::new(u64::MAX, Decimal::MAX, dec!(0)).unwrap_err();
        assert!(matches!(err, UnitError::OutOfRange(_)));

        let err = RegistrySummary::new(1, Decimal::MAX, Decimal::MAX).unwrap_err();
        assert!(matches!(err, UnitError::OutOfRange(_)));
    }

    #[test]
    fn test_average_fees() {
        let tokens = vec![token_with_fees(dec!(2), dec!(0.5)), token_with_fees(dec!(1), dec!(3))];
        let avg = AverageFees::from_tokens(&tokens);

        assert_eq!(avg.reflection, Some(dec!(1.5)));
        assert_eq!(avg.burn, Some(dec!(1.75)));
        assert_eq!(avg.get(FeeKind::Liquidity), Some(dec!(1)));
    }

    #[test]
    fn test_average_fees_without_tokens() {
        let avg = AverageFees::from_tokens(&[]);
        assert_eq!(avg, AverageFees::default());
        assert!(avg.reflection.is_none());
    }

    #[test]
    fn test_report_summary() {
        let registry = RegistrySummary::new(2, dec!(0.2), dec!(0.4)).unwrap();
        let report = AnalyticsReport::new(
            registry,
            vec![token_with_fees(dec!(2), dec!(0)), token_with_fees(dec!(1), dec!(0))],
        );

        assert_eq!(report.summary.total_tokens_deployed, 2);
        assert_eq!(report.summary.total_value_collected, dec!(0.8));
        assert_eq!(report.summary.average_fees.reflection, Some(dec!(1.5)));
    }
}
