//! Fee Settings
//!
//! Four fee dimensions (reflection, liquidity, treasury, burn), each with an
//! "apply to all transfers" flag. Percentages are what humans configure; basis
//! points are what the token contract stores.

use ethers::abi::Token;
use ethers::types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::units::{from_basis_points, to_basis_points, UnitError};

/// Fee dimensions in contract order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Reflection,
    Liquidity,
    Treasury,
    Burn,
}

impl FeeKind {
    pub const ALL: [FeeKind; 4] = [
        FeeKind::Reflection,
        FeeKind::Liquidity,
        FeeKind::Treasury,
        FeeKind::Burn,
    ];

    /// Getter for the rate, in basis points
    pub fn rate_getter(&self) -> &'static str {
        match self {
            FeeKind::Reflection => "_reflectionFee",
            FeeKind::Liquidity => "_liquidityFee",
            FeeKind::Treasury => "_treasuryFee",
            FeeKind::Burn => "_burnFee",
        }
    }

    /// Getter for the apply-to-all flag
    pub fn flag_getter(&self) -> &'static str {
        match self {
            FeeKind::Reflection => "_applyReflectionFeeToAll",
            FeeKind::Liquidity => "_applyLiquidityFeeToAll",
            FeeKind::Treasury => "_applyTreasuryFeeToAll",
            FeeKind::Burn => "_applyBurnFeeToAll",
        }
    }
}

impl std::fmt::Display for FeeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeKind::Reflection => write!(f, "reflection"),
            FeeKind::Liquidity => write!(f, "liquidity"),
            FeeKind::Treasury => write!(f, "treasury"),
            FeeKind::Burn => write!(f, "burn"),
        }
    }
}

/// A single on-chain fee rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate {
    /// Rate in basis points (0-10000)
    pub bps: u32,
    /// Apply on every transfer, not only exchange-facing ones
    pub apply_to_all: bool,
}

impl FeeRate {
    pub fn percent(&self) -> Decimal {
        from_basis_points(self.bps)
    }
}

/// Fee settings as encoded on-chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSettings {
    pub reflection: FeeRate,
    pub liquidity: FeeRate,
    pub treasury: FeeRate,
    pub burn: FeeRate,
}

impl FeeSettings {
    /// Encode human-facing percentages into basis points
    pub fn from_percentages(percentages: &FeePercentages) -> Result<Self, UnitError> {
        Ok(Self {
            reflection: FeeRate {
                bps: to_basis_points(percentages.reflection)?,
                apply_to_all: percentages.apply_reflection_to_all,
            },
            liquidity: FeeRate {
                bps: to_basis_points(percentages.liquidity)?,
                apply_to_all: percentages.apply_liquidity_to_all,
            },
            treasury: FeeRate {
                bps: to_basis_points(percentages.treasury)?,
                apply_to_all: percentages.apply_treasury_to_all,
            },
            burn: FeeRate {
                bps: to_basis_points(percentages.burn)?,
                apply_to_all: percentages.apply_burn_to_all,
            },
        })
    }

    pub fn rate(&self, kind: FeeKind) -> FeeRate {
        match kind {
            FeeKind::Reflection => self.reflection,
            FeeKind::Liquidity => self.liquidity,
            FeeKind::Treasury => self.treasury,
            FeeKind::Burn => self.burn,
        }
    }

    pub fn rate_mut(&mut self, kind: FeeKind) -> &mut FeeRate {
        match kind {
            FeeKind::Reflection => &mut self.reflection,
            FeeKind::Liquidity => &mut self.liquidity,
            FeeKind::Treasury => &mut self.treasury,
            FeeKind::Burn => &mut self.burn,
        }
    }

    /// Sum of all four rates in basis points
    pub fn total_bps(&self) -> u32 {
        FeeKind::ALL.iter().map(|k| self.rate(*k).bps).sum()
    }

    /// Decode back into percentages
    pub fn to_percentages(&self) -> FeePercentages {
        FeePercentages {
            reflection: self.reflection.percent(),
            liquidity: self.liquidity.percent(),
            treasury: self.treasury.percent(),
            burn: self.burn.percent(),
            apply_reflection_to_all: self.reflection.apply_to_all,
            apply_liquidity_to_all: self.liquidity.apply_to_all,
            apply_treasury_to_all: self.treasury.apply_to_all,
            apply_burn_to_all: self.burn.apply_to_all,
        }
    }

    /// Constructor tuple: (reflectionFeeBps, applyReflectionFeeToAll, liquidityFeeBps, ...)
    pub fn to_abi(&self) -> Token {
        let fields = FeeKind::ALL
            .iter()
            .flat_map(|kind| {
                let rate = self.rate(*kind);
                [Token::Uint(U256::from(rate.bps)), Token::Bool(rate.apply_to_all)]
            })
            .collect();
        Token::Tuple(fields)
    }
}

/// Fee configuration in percent, as written by operators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePercentages {
    pub reflection: Decimal,
    pub liquidity: Decimal,
    pub treasury: Decimal,
    pub burn: Decimal,
    #[serde(default)]
    pub apply_reflection_to_all: bool,
    #[serde(default)]
    pub apply_liquidity_to_all: bool,
    #[serde(default)]
    pub apply_treasury_to_all: bool,
    #[serde(default)]
    pub apply_burn_to_all: bool,
}

impl FeePercentages {
    /// Same flag for every dimension
    pub fn new(reflection: Decimal, liquidity: Decimal, treasury: Decimal, burn: Decimal, apply_to_all: bool) -> Self {
        Self {
            reflection,
            liquidity,
            treasury,
            burn,
            apply_reflection_to_all: apply_to_all,
            apply_liquidity_to_all: apply_to_all,
            apply_treasury_to_all: apply_to_all,
            apply_burn_to_all: apply_to_all,
        }
    }

    pub fn rate(&self, kind: FeeKind) -> Decimal {
        match kind {
            FeeKind::Reflection => self.reflection,
            FeeKind::Liquidity => self.liquidity,
            FeeKind::Treasury => self.treasury,
            FeeKind::Burn => self.burn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_percentages() {
        let pct = FeePercentages::new(dec!(2), dec!(3), dec!(1), dec!(0.5), false);
        let settings = FeeSettings::from_percentages(&pct).unwrap();

        assert_eq!(settings.reflection.bps, 200);
        assert_eq!(settings.liquidity.bps, 300);
        assert_eq!(settings.treasury.bps, 100);
        assert_eq!(settings.burn.bps, 50);
        assert_eq!(settings.total_bps(), 650);
        assert!(!settings.burn.apply_to_all);
    }

    #[test]
    fn test_negative_percentage_fails() {
        let pct = FeePercentages::new(dec!(2), dec!(-1), dec!(1), dec!(0.5), false);
        assert!(matches!(
            FeeSettings::from_percentages(&pct),
            Err(UnitError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_percentages_round_trip() {
        let mut pct = FeePercentages::new(dec!(1), dec!(2), dec!(0.5), dec!(3), true);
        pct.apply_liquidity_to_all = false;
        let settings = FeeSettings::from_percentages(&pct).unwrap();
        assert_eq!(settings.to_percentages(), pct);
    }

    #[test]
    fn test_abi_tuple_layout() {
        let pct = FeePercentages::new(dec!(2), dec!(3), dec!(1), dec!(0.5), true);
        let settings = FeeSettings::from_percentages(&pct).unwrap();

        let fields = settings.to_abi().into_tuple().unwrap();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], Token::Uint(U256::from(200)));
        assert_eq!(fields[1], Token::Bool(true));
        assert_eq!(fields[6], Token::Uint(U256::from(50)));
    }
}
