//! Conversion between display amounts and raw on-chain units.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::DomainError;

/// Largest scale `rust_decimal` can carry.
const MAX_DECIMAL_SCALE: u8 = 28;

fn scale_factor(decimals: u8) -> Result<Decimal, DomainError> {
    if decimals > MAX_DECIMAL_SCALE {
        return Err(DomainError::UnsupportedDecimals { decimals });
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(u32::from(decimals)), 0))
}

/// Convert a display amount to raw units, truncating dust below one unit.
pub fn to_units(amount: Decimal, decimals: u8) -> Result<U256, DomainError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::NegativeAmount { amount });
    }
    let scaled = amount
        .checked_mul(scale_factor(decimals)?)
        .ok_or(DomainError::Overflow {
            context: "amount to units",
        })?
        .trunc();
    let units = scaled.to_u128().ok_or(DomainError::Overflow {
        context: "amount to units",
    })?;
    Ok(U256::from(units))
}

/// Convert raw units to a display amount.
pub fn from_units(raw: U256, decimals: u8) -> Result<Decimal, DomainError> {
    if decimals > MAX_DECIMAL_SCALE {
        return Err(DomainError::UnsupportedDecimals { decimals });
    }
    let overflow = DomainError::Overflow {
        context: "units to amount",
    };
    let value = u128::try_from(raw).map_err(|_| overflow.clone())?;
    let value = i128::try_from(value).map_err(|_| overflow.clone())?;
    Decimal::try_from_i128_with_scale(value, u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|_| overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn to_units_scales_by_decimals() {
        assert_eq!(to_units(dec!(1.5), 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(
            to_units(dec!(2), 18).unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn to_units_truncates_sub_unit_dust() {
        assert_eq!(to_units(dec!(0.0000015), 6).unwrap(), U256::from(1u8));
    }

    #[test]
    fn to_units_rejects_negative() {
        assert!(matches!(
            to_units(dec!(-1), 18),
            Err(DomainError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn from_units_restores_display_amount() {
        assert_eq!(from_units(U256::from(1_500_000u64), 6).unwrap(), dec!(1.5));
        assert_eq!(from_units(U256::ZERO, 18).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn from_units_rejects_values_beyond_decimal_range() {
        assert!(from_units(U256::MAX, 18).is_err());
    }
}
