//! Unit Conversion
//!
//! Translates human-facing values into their on-chain encodings:
//! - fee percentages <-> basis points (1 bps = 0.01%)
//! - decimal token/ETH amounts <-> smallest on-chain units

use ethers::types::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Decimals used by every token deployed through this crate
pub const TOKEN_DECIMALS: u32 = 9;

/// Decimals of the ledger's native value unit (wei per ETH)
pub const NATIVE_DECIMALS: u32 = 18;

/// Basis points in one percent
const BPS_PER_PERCENT: u32 = 100;

/// Largest scale a `Decimal` can carry
const MAX_DECIMAL_SCALE: u32 = 28;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Invalid fee rate: {0}% (must be >= 0)")]
    InvalidRate(Decimal),

    #[error("Precision loss: {amount} has more than {decimals} fractional digits")]
    PrecisionLoss { amount: Decimal, decimals: u32 },

    #[error("Negative amount: {0}")]
    NegativeAmount(Decimal),

    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

/// Convert a fee percentage into basis points: `round(percent * 100)`
pub fn to_basis_points(percent: Decimal) -> Result<u32, UnitError> {
    if percent.is_sign_negative() && !percent.is_zero() {
        return Err(UnitError::InvalidRate(percent));
    }

    let scaled = percent
        .checked_mul(Decimal::from(BPS_PER_PERCENT))
        .ok_or_else(|| UnitError::OutOfRange(format!("{}% does not fit in basis points", percent)))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    scaled
        .to_u32()
        .ok_or_else(|| UnitError::OutOfRange(format!("{}% does not fit in basis points", percent)))
}

/// Convert basis points back into a percentage: `bps / 100`
pub fn from_basis_points(bps: u32) -> Decimal {
    Decimal::new(bps as i64, 2).normalize()
}

/// Convert a decimal amount into integer smallest units
///
/// Fails with `PrecisionLoss` if `amount` carries more fractional digits than
/// `decimals`, so the result always converts back to the same value.
pub fn to_smallest_unit(amount: Decimal, decimals: u32) -> Result<U256, UnitError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitError::NegativeAmount(amount));
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > decimals {
        return Err(UnitError::PrecisionLoss { amount, decimals });
    }

    let mantissa = normalized.mantissa().unsigned_abs();
    U256::from(mantissa)
        .checked_mul(U256::exp10((decimals - scale) as usize))
        .ok_or_else(|| UnitError::OutOfRange(format!("{} at {} decimals overflows U256", amount, decimals)))
}

/// Convert integer smallest units back into a decimal amount
pub fn from_smallest_unit(value: U256, decimals: u32) -> Result<Decimal, UnitError> {
    if decimals > MAX_DECIMAL_SCALE {
        return Err(UnitError::OutOfRange(format!(
            "{} decimals exceeds the supported scale of {}",
            decimals, MAX_DECIMAL_SCALE
        )));
    }

    if value > U256::from(i128::MAX as u128) {
        return Err(UnitError::OutOfRange(format!("{} does not fit in a decimal", value)));
    }

    Decimal::try_from_i128_with_scale(value.as_u128() as i128, decimals)
        .map(|d| d.normalize())
        .map_err(|e| UnitError::OutOfRange(format!("{}: {}", value, e)))
}

/// Whole tokens -> smallest token units (9 decimals)
pub fn token_amount(amount: Decimal) -> Result<U256, UnitError> {
    to_smallest_unit(amount, TOKEN_DECIMALS)
}

/// ETH -> wei
pub fn native_amount(eth: Decimal) -> Result<U256, UnitError> {
    to_smallest_unit(eth, NATIVE_DECIMALS)
}

/// wei -> ETH
pub fn format_native(wei: U256) -> Result<Decimal, UnitError> {
    from_smallest_unit(wei, NATIVE_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_basis_points() {
        assert_eq!(to_basis_points(dec!(2)).unwrap(), 200);
        assert_eq!(to_basis_points(dec!(0.5)).unwrap(), 50);
        assert_eq!(to_basis_points(dec!(0)).unwrap(), 0);
        assert_eq!(to_basis_points(dec!(100)).unwrap(), 10_000);
    }

    #[test]
    fn test_to_basis_points_rounds_half_away_from_zero() {
        assert_eq!(to_basis_points(dec!(0.125)).unwrap(), 13);
        assert_eq!(to_basis_points(dec!(0.124)).unwrap(), 12);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = to_basis_points(dec!(-0.01)).unwrap_err();
        assert_eq!(err, UnitError::InvalidRate(dec!(-0.01)));
    }

    #[test]
    fn test_oversized_rate_is_out_of_range() {
        assert!(matches!(to_basis_points(Decimal::MAX), Err(UnitError::OutOfRange(_))));
        assert!(matches!(to_basis_points(dec!(50000000)), Err(UnitError::OutOfRange(_))));
    }

    #[test]
    fn test_basis_points_round_trip() {
        // Every two-decimal percentage from 0.00% to 100.00%
        for hundredths in 0..=10_000i64 {
            let percent = Decimal::new(hundredths, 2);
            let bps = to_basis_points(percent).unwrap();
            assert_eq!(from_basis_points(bps), percent, "round trip failed for {}", percent);
        }
    }

    #[test]
    fn test_from_basis_points() {
        assert_eq!(from_basis_points(150), dec!(1.5));
        assert_eq!(from_basis_points(5), dec!(0.05));
    }

    #[test]
    fn test_token_amount() {
        assert_eq!(token_amount(dec!(1000000)).unwrap(), U256::from(1_000_000_000_000_000u64));
        assert_eq!(token_amount(dec!(0.000000001)).unwrap(), U256::one());
    }

    #[test]
    fn test_native_amount() {
        assert_eq!(native_amount(dec!(0.2)).unwrap(), U256::from(200_000_000_000_000_000u64));
    }

    #[test]
    fn test_precision_loss() {
        let err = to_smallest_unit(dec!(1.0000000001), TOKEN_DECIMALS).unwrap_err();
        assert!(matches!(err, UnitError::PrecisionLoss { decimals: 9, .. }));
    }

    #[test]
    fn test_trailing_zeros_are_not_precision_loss() {
        // 1.50000000000 has scale 11 but only one significant fractional digit
        let amount = Decimal::new(150_000_000_000, 11);
        assert_eq!(token_amount(amount).unwrap(), U256::from(1_500_000_000u64));
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(matches!(token_amount(dec!(-1)), Err(UnitError::NegativeAmount(_))));
    }

    #[test]
    fn test_smallest_unit_round_trip() {
        for amount in [dec!(0), dec!(1), dec!(0.2), dec!(123.456789), dec!(2000000)] {
            let wei = native_amount(amount).unwrap();
            assert_eq!(format_native(wei).unwrap(), amount);
        }
    }

    #[test]
    fn test_from_smallest_unit_out_of_range() {
        assert!(matches!(from_smallest_unit(U256::MAX, 9), Err(UnitError::OutOfRange(_))));
        assert!(matches!(from_smallest_unit(U256::one(), 29), Err(UnitError::OutOfRange(_))));
    }
}
