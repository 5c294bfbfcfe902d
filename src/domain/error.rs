//! Domain validation errors.
//!
//! These errors are returned by `try_new` constructors and pure calculations
//! before anything touches the network.
//!
//! # Examples
//!
//! ```
//! use futarchy_liquidity::domain::error::DomainError;
//! use futarchy_liquidity::domain::market::MarketParameters;
//! use rust_decimal_macros::dec;
//!
//! let result = MarketParameters::try_new(dec!(100), dec!(1.5), dec!(0.1));
//! assert!(matches!(result, Err(DomainError::ProbabilityOutOfRange { .. })));
//! ```

use alloy_primitives::Address;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Address could not be parsed or is the zero address.
    #[error("invalid address '{input}': {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A pair was built from the same token twice.
    #[error("pair tokens must differ, got {address} twice")]
    IdenticalTokens {
        /// The duplicated address.
        address: Address,
    },

    /// Spot price must be strictly positive.
    #[error("spot price must be positive, got {spot}")]
    NonPositiveSpotPrice {
        /// The rejected spot price.
        spot: Decimal,
    },

    /// Event probability must lie within `[0, 1]`.
    #[error("event probability must be within [0, 1], got {probability}")]
    ProbabilityOutOfRange {
        /// The rejected probability.
        probability: Decimal,
    },

    /// Impact must be non-negative.
    #[error("impact must be non-negative, got {impact}")]
    NegativeImpact {
        /// The rejected impact.
        impact: Decimal,
    },

    /// `impact * probability` must stay below one so the NO price is positive.
    #[error("impact {impact} x probability {probability} must be below 1")]
    DegenerateNoPrice {
        /// The configured impact.
        impact: Decimal,
        /// The configured probability.
        probability: Decimal,
    },

    /// The expected value of the conditional prices drifted from spot.
    #[error("expected value {expected} deviates from spot {spot} beyond tolerance")]
    PriceConservation {
        /// `p * yes + (1 - p) * no`.
        expected: Decimal,
        /// The spot price it should equal.
        spot: Decimal,
    },

    /// A pool price must be strictly positive.
    #[error("pool price must be positive, got {price}")]
    NonPositivePrice {
        /// The rejected price.
        price: Decimal,
    },

    /// A decimal arithmetic step overflowed.
    #[error("arithmetic overflow in {context}")]
    Overflow {
        /// Which calculation overflowed.
        context: &'static str,
    },

    /// Amounts must be non-negative.
    #[error("amount must be non-negative, got {amount}")]
    NegativeAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// Token decimals beyond what decimal math can represent.
    #[error("unsupported token decimals {decimals}")]
    UnsupportedDecimals {
        /// The token's decimals.
        decimals: u8,
    },

    /// Removal percentage must be within `[1, 100]`.
    #[error("removal percentage must be within [1, 100], got {percentage}")]
    InvalidPercentage {
        /// The rejected percentage.
        percentage: u32,
    },

    /// Tick spacing must be positive.
    #[error("tick spacing must be positive, got {spacing}")]
    InvalidTickSpacing {
        /// The rejected spacing.
        spacing: i32,
    },

    /// Encoded sqrt price falls outside the AMM's valid range.
    #[error("sqrt price {sqrt_price} outside the valid AMM range")]
    SqrtPriceOutOfRange {
        /// The encoded value.
        sqrt_price: String,
    },

    /// A deposit needs at least one side and a price to derive the other.
    #[error("cannot derive deposit amounts: {reason}")]
    UnderspecifiedDeposit {
        /// What was missing.
        reason: &'static str,
    },

    /// Pool index outside `1..=6`.
    #[error("pool index {index} out of range 1..=6")]
    InvalidPoolIndex {
        /// The rejected index.
        index: usize,
    },
}
