//! Builders for domain primitives used across tests.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;

use crate::domain::market::MarketParameters;
use crate::domain::pool::ProposalTokens;

/// Address whose last byte is `n`.
pub fn addr(n: u8) -> Address {
    Address::with_last_byte(n)
}

/// Whole tokens of an 18-decimal token as raw units.
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

/// Proposal tokens laid out so that pools 3-6 are inverted in AMM order
/// while pools 1 and 2 are not.
pub fn proposal_tokens() -> ProposalTokens {
    ProposalTokens {
        company: addr(0x10),
        currency: addr(0x01),
        yes_company: addr(0x20),
        no_company: addr(0x21),
        yes_currency: addr(0x30),
        no_currency: addr(0x31),
    }
}

pub fn proposal_address() -> Address {
    addr(0xa1)
}

pub fn adapter_address() -> Address {
    addr(0xad)
}

/// Market parameters from plain decimals; impact is a fraction.
pub fn market(spot: Decimal, probability: Decimal, impact: Decimal) -> MarketParameters {
    MarketParameters::try_new(spot, probability, impact).expect("valid market parameters")
}
