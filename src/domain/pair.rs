//! Logical versus AMM token ordering.
//!
//! The AMM stores every pool as `(token0, token1)` sorted by ascending
//! address. Callers think in terms of "price of A in B". [`AmmPair`] is the
//! single place where the two orders are reconciled: it is computed once per
//! pair and then threaded through price encoding, deposit amounts and price
//! read-back, so no call site re-derives the inversion on its own.
//!
//! # Examples
//!
//! ```
//! use alloy_primitives::Address;
//! use futarchy_liquidity::domain::pair::AmmPair;
//!
//! let low = Address::with_last_byte(1);
//! let high = Address::with_last_byte(2);
//!
//! let pair = AmmPair::normalize(high, low).unwrap();
//! assert_eq!(pair.token0(), low);
//! assert!(pair.is_inverted());
//! assert_eq!(pair.to_amm_order(10u32, 1050u32), (1050, 10));
//! ```

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Caller-specified ordering; price is quoted as tokenB per tokenA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPair {
    pub token_a: Address,
    pub token_b: Address,
}

/// Which token is the quote side of a [`PricePoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// token1 per token0, as the AMM stores it.
    Amm,
    /// tokenB per tokenA, as the caller asked for it.
    Logical,
}

/// A price ratio that always carries its orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    value: Decimal,
    orientation: Orientation,
}

impl PricePoint {
    /// Build a price in caller orientation; it must be strictly positive.
    pub fn logical(value: Decimal) -> Result<Self, DomainError> {
        Self::new(value, Orientation::Logical)
    }

    /// Build a price in AMM orientation; it must be strictly positive.
    pub fn amm(value: Decimal) -> Result<Self, DomainError> {
        Self::new(value, Orientation::Amm)
    }

    fn new(value: Decimal, orientation: Orientation) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::NonPositivePrice { price: value });
        }
        Ok(Self { value, orientation })
    }

    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.value
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn reciprocal(self, orientation: Orientation) -> Result<Self, DomainError> {
        let value = Decimal::ONE
            .checked_div(self.value)
            .ok_or(DomainError::Overflow {
                context: "price inversion",
            })?;
        Self::new(value, orientation)
    }

    /// Relative deviation `|self - other| / other`, compared in the same orientation.
    #[must_use]
    pub fn relative_deviation(&self, other: &PricePoint) -> Decimal {
        debug_assert_eq!(self.orientation, other.orientation);
        ((self.value - other.value) / other.value).abs()
    }
}

/// AMM slot a token occupies in a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmmSlot {
    Token0,
    Token1,
}

/// Canonical pair with `token0 < token1` and the inversion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmPair {
    token0: Address,
    token1: Address,
    inverted: bool,
}

impl AmmPair {
    /// Sort a logical `(a, b)` pair into AMM order.
    ///
    /// `inverted` is true when `a` lands in the token1 slot.
    pub fn normalize(token_a: Address, token_b: Address) -> Result<Self, DomainError> {
        if token_a == token_b {
            return Err(DomainError::IdenticalTokens { address: token_a });
        }
        // Address compares its 20 bytes, which is the case-insensitive hex order.
        let inverted = token_a > token_b;
        let (token0, token1) = if inverted {
            (token_b, token_a)
        } else {
            (token_a, token_b)
        };
        Ok(Self {
            token0,
            token1,
            inverted,
        })
    }

    #[must_use]
    pub const fn token0(&self) -> Address {
        self.token0
    }

    #[must_use]
    pub const fn token1(&self) -> Address {
        self.token1
    }

    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// The caller's ordering this pair was normalized from.
    #[must_use]
    pub const fn logical(&self) -> LogicalPair {
        if self.inverted {
            LogicalPair {
                token_a: self.token1,
                token_b: self.token0,
            }
        } else {
            LogicalPair {
                token_a: self.token0,
                token_b: self.token1,
            }
        }
    }

    /// AMM slot of the logical tokenA.
    #[must_use]
    pub const fn slot_of_a(&self) -> AmmSlot {
        if self.inverted {
            AmmSlot::Token1
        } else {
            AmmSlot::Token0
        }
    }

    /// Reorder logical `(a, b)` values into `(value0, value1)`.
    pub fn to_amm_order<T>(&self, a: T, b: T) -> (T, T) {
        if self.inverted {
            (b, a)
        } else {
            (a, b)
        }
    }

    /// Reorder `(value0, value1)` back into logical `(a, b)`.
    pub fn to_logical_order<T>(&self, value0: T, value1: T) -> (T, T) {
        if self.inverted {
            (value1, value0)
        } else {
            (value0, value1)
        }
    }

    /// Express a price in caller orientation.
    pub fn to_logical_price(&self, price: PricePoint) -> Result<PricePoint, DomainError> {
        match price.orientation {
            Orientation::Logical => Ok(price),
            Orientation::Amm if self.inverted => price.reciprocal(Orientation::Logical),
            Orientation::Amm => PricePoint::logical(price.value),
        }
    }

    /// Express a price in AMM orientation.
    pub fn to_amm_price(&self, price: PricePoint) -> Result<PricePoint, DomainError> {
        match price.orientation {
            Orientation::Amm => Ok(price),
            Orientation::Logical if self.inverted => price.reciprocal(Orientation::Amm),
            Orientation::Logical => PricePoint::amm(price.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn addr(n: u8) -> Address {
        Address::with_last_byte(n)
    }

    fn sample_addresses() -> Vec<Address> {
        vec![
            addr(1),
            addr(2),
            addr(0xff),
            Address::repeat_byte(0x11),
            Address::repeat_byte(0xab),
            "0x2E8D98fd126a32362F2Bd8aA427E59a1ec63F780".parse().unwrap(),
            "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359".parse().unwrap(),
        ]
    }

    #[test]
    fn token0_is_always_lower_and_inversion_is_antisymmetric() {
        let addresses = sample_addresses();
        for &a in &addresses {
            for &b in &addresses {
                if a == b {
                    continue;
                }
                let ab = AmmPair::normalize(a, b).unwrap();
                let ba = AmmPair::normalize(b, a).unwrap();
                assert!(ab.token0() < ab.token1());
                assert_eq!(ab.token0(), ba.token0());
                assert_eq!(ab.is_inverted(), !ba.is_inverted());
            }
        }
    }

    #[test]
    fn identical_tokens_are_rejected() {
        assert!(matches!(
            AmmPair::normalize(addr(3), addr(3)),
            Err(DomainError::IdenticalTokens { .. })
        ));
    }

    #[test]
    fn logical_round_trip() {
        let pair = AmmPair::normalize(addr(9), addr(4)).unwrap();
        let logical = pair.logical();
        assert_eq!(logical.token_a, addr(9));
        assert_eq!(logical.token_b, addr(4));
        assert_eq!(pair.slot_of_a(), AmmSlot::Token1);
        assert_eq!(pair.to_logical_order(1050, 10), (10, 1050));
    }

    #[test]
    fn inverted_pair_reciprocates_prices() {
        let pair = AmmPair::normalize(addr(9), addr(4)).unwrap();
        let amm = PricePoint::amm(dec!(4)).unwrap();
        let logical = pair.to_logical_price(amm).unwrap();
        assert_eq!(logical.orientation(), Orientation::Logical);
        assert_eq!(logical.value(), dec!(0.25));
        assert_eq!(pair.to_amm_price(logical).unwrap().value(), dec!(4));
    }

    #[test]
    fn straight_pair_keeps_price_value() {
        let pair = AmmPair::normalize(addr(1), addr(2)).unwrap();
        let amm = PricePoint::amm(dec!(105)).unwrap();
        assert_eq!(pair.to_logical_price(amm).unwrap().value(), dec!(105));
    }

    #[test]
    fn non_positive_price_is_rejected() {
        assert!(PricePoint::logical(Decimal::ZERO).is_err());
        assert!(PricePoint::amm(dec!(-1)).is_err());
    }
}
