//! Fixed-point price encoding and tick range math for concentrated liquidity pools.
//!
//! Prices are stored on chain as `sqrtPriceX96 = sqrt(amount1 / amount0) * 2^96`
//! over raw token units. Encoding here is exact integer arithmetic over
//! 512-bit intermediates: `floor(sqrt(x)) == isqrt(floor(x))`, so
//! `isqrt((amount1 << 192) / amount0)` is exactly
//! `floor(sqrt(amount1 / amount0) * 2^96)`.

use alloy_primitives::{U256, U512};
use rust_decimal::Decimal;

use super::error::DomainError;
use super::pair::PricePoint;

/// Lowest tick representable by the AMM.
pub const MIN_TICK: i32 = -887_272;

/// Highest tick representable by the AMM.
pub const MAX_TICK: i32 = 887_272;

/// `sqrtPriceX96` at [`MIN_TICK`].
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);

/// `sqrtPriceX96` at [`MAX_TICK`].
pub const MAX_SQRT_RATIO: U256 = U256::from_limbs([
    0x5d95_1d52_6398_8d26,
    0xefd1_fc6a_5064_8849,
    0xfffd_8963,
    0,
]);

/// Fixed-point scale used when decoding prices into decimals.
const DECODE_SCALE: u32 = 18;

fn widen(value: U256) -> U512 {
    let l = value.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

fn narrow(value: U512) -> Option<U256> {
    let l = value.as_limbs();
    if l[4..].iter().any(|&limb| limb != 0) {
        return None;
    }
    Some(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

/// Integer square root (floor) by Newton iteration.
fn isqrt(n: U512) -> U512 {
    let two = U512::from(2u8);
    if n < two {
        return n;
    }
    // Start above the root so the sequence decreases monotonically.
    let mut x = U512::from(1u8) << ((n.bit_len() + 1) / 2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Encode an initialization price from AMM-ordered raw amounts.
///
/// Both amounts must be non-zero and the result must fall inside
/// `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
pub fn encode_sqrt_price_x96(amount0: U256, amount1: U256) -> Result<U256, DomainError> {
    if amount0.is_zero() || amount1.is_zero() {
        return Err(DomainError::UnderspecifiedDeposit {
            reason: "both AMM amounts must be non-zero to encode a price",
        });
    }
    let ratio = (widen(amount1) << 192) / widen(amount0);
    let root = isqrt(ratio);
    let sqrt_price = narrow(root).ok_or_else(|| DomainError::SqrtPriceOutOfRange {
        sqrt_price: root.to_string(),
    })?;
    if sqrt_price < MIN_SQRT_RATIO || sqrt_price >= MAX_SQRT_RATIO {
        return Err(DomainError::SqrtPriceOutOfRange {
            sqrt_price: sqrt_price.to_string(),
        });
    }
    Ok(sqrt_price)
}

/// Decode `sqrtPriceX96` into a display price of token1 per token0.
///
/// The raw ratio is adjusted by `10^(decimals0 - decimals1)` so the result is
/// in whole-token terms.
pub fn decode_sqrt_price_x96(
    sqrt_price_x96: U256,
    decimals0: u8,
    decimals1: u8,
) -> Result<PricePoint, DomainError> {
    let overflow = DomainError::Overflow {
        context: "sqrt price decode",
    };
    let ten = U512::from(10u8);
    let squared = widen(sqrt_price_x96) * widen(sqrt_price_x96);
    let numerator = squared * ten.pow(U512::from(DECODE_SCALE + u32::from(decimals0)));
    let denominator = (U512::from(1u8) << 192) * ten.pow(U512::from(u32::from(decimals1)));
    let scaled = narrow(numerator / denominator).ok_or(overflow.clone())?;
    let scaled = u128::try_from(scaled).map_err(|_| overflow.clone())?;
    let scaled = i128::try_from(scaled).map_err(|_| overflow.clone())?;
    let value = Decimal::try_from_i128_with_scale(scaled, DECODE_SCALE).map_err(|_| overflow)?;
    PricePoint::amm(value.normalize())
}

/// Widest tick range aligned to `spacing` that stays inside the AMM bounds.
pub fn full_range_ticks(spacing: i32) -> Result<(i32, i32), DomainError> {
    if spacing <= 0 {
        return Err(DomainError::InvalidTickSpacing { spacing });
    }
    let upper = (MAX_TICK / spacing) * spacing;
    let lower = -((-MIN_TICK) / spacing) * spacing;
    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn q96() -> U512 {
        U512::from(1u8) << 96
    }

    #[test]
    fn max_sqrt_ratio_constant_matches_reference() {
        assert_eq!(
            MAX_SQRT_RATIO.to_string(),
            "1461446703485210103287273052203988822378723970342"
        );
    }

    #[test]
    fn equal_amounts_encode_to_q96() {
        let sqrt = encode_sqrt_price_x96(U256::from(1000u64), U256::from(1000u64)).unwrap();
        assert_eq!(widen(sqrt), q96());
    }

    #[test]
    fn encoding_is_the_exact_floor() {
        let sqrt = encode_sqrt_price_x96(U256::from(10u8), U256::from(1050u64)).unwrap();
        // floor(sqrt(105) * 2^96) brackets 105 * 2^192 between r^2 and (r+1)^2.
        let target = U512::from(105u8) << 192;
        let r = widen(sqrt);
        assert!(r * r <= target);
        let next = r + U512::from(1u8);
        assert!(next * next > target);
    }

    #[test]
    fn perfect_square_ratio_is_exact() {
        let sqrt = encode_sqrt_price_x96(U256::from(1u8), U256::from(4u8)).unwrap();
        assert_eq!(widen(sqrt), q96() * U512::from(2u8));
    }

    #[test]
    fn zero_amount_cannot_be_encoded() {
        assert!(encode_sqrt_price_x96(U256::ZERO, U256::from(1u8)).is_err());
    }

    #[test]
    fn decode_inverts_encode_with_decimals() {
        // 1 token0 (18 decimals) for 2000 token1 (6 decimals).
        let amount0 = U256::from(1_000_000_000_000_000_000u128);
        let amount1 = U256::from(2_000_000_000u64);
        let sqrt = encode_sqrt_price_x96(amount0, amount1).unwrap();
        let price = decode_sqrt_price_x96(sqrt, 18, 6).unwrap();
        assert!((price.value() - dec!(2000)).abs() < dec!(0.000001));
    }

    #[test]
    fn decode_q96_is_one() {
        let q = narrow(q96()).unwrap();
        assert_eq!(decode_sqrt_price_x96(q, 18, 18).unwrap().value(), dec!(1));
    }

    #[test]
    fn full_range_stays_inside_bounds() {
        assert_eq!(full_range_ticks(60).unwrap(), (-887_220, 887_220));
        assert_eq!(full_range_ticks(1).unwrap(), (MIN_TICK, MAX_TICK));
        assert_eq!(full_range_ticks(200).unwrap(), (-887_200, 887_200));
        assert!(full_range_ticks(0).is_err());
    }
}
