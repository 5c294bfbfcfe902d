//! Token metadata, balances and address parsing.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amount::from_units;
use super::error::DomainError;

/// Parse a user-supplied address, rejecting malformed input and the zero address.
///
/// Runs before any network call so typos never reach the chain.
pub fn parse_address(input: &str) -> Result<Address, DomainError> {
    let trimmed = input.trim();
    let address = Address::from_str(trimmed).map_err(|e| DomainError::InvalidAddress {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    if address == Address::ZERO {
        return Err(DomainError::InvalidAddress {
            input: trimmed.to_string(),
            reason: "zero address".into(),
        });
    }
    Ok(address)
}

/// Canonical lowercase `0x` form of an address.
#[must_use]
pub fn canonical(address: Address) -> String {
    format!("{address:#x}")
}

/// Static token metadata, loaded once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMeta {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Label used in error messages: `SYMBOL (0x...)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.symbol, canonical(self.address))
    }

    /// Convert raw units to a display amount, falling back to zero on overflow.
    #[must_use]
    pub fn display_amount(&self, raw: U256) -> Decimal {
        from_units(raw, self.decimals).unwrap_or_default()
    }
}

impl fmt::Display for TokenMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Where a balance value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Read from chain for the current decision.
    Fresh,
    /// Remembered from an earlier read; never valid for a sufficiency check.
    Cached,
}

/// A raw token balance tagged with its freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    raw: U256,
    freshness: Freshness,
}

impl Balance {
    #[must_use]
    pub const fn fresh(raw: U256) -> Self {
        Self {
            raw,
            freshness: Freshness::Fresh,
        }
    }

    #[must_use]
    pub const fn cached(raw: U256) -> Self {
        Self {
            raw,
            freshness: Freshness::Cached,
        }
    }

    #[must_use]
    pub const fn raw(&self) -> U256 {
        self.raw
    }

    #[must_use]
    pub const fn freshness(&self) -> Freshness {
        self.freshness
    }

    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }

    /// Demote to cached; used when the session remembers a read.
    #[must_use]
    pub const fn into_cached(self) -> Self {
        Self::cached(self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_mixed_case() {
        let address = parse_address("0x2E8D98fd126a32362F2Bd8aA427E59a1ec63F780").unwrap();
        assert_eq!(
            canonical(address),
            "0x2e8d98fd126a32362f2bd8aa427e59a1ec63f780"
        );
    }

    #[test]
    fn parse_address_rejects_garbage_and_zero() {
        assert!(matches!(
            parse_address("0x1234"),
            Err(DomainError::InvalidAddress { .. })
        ));
        assert!(matches!(
            parse_address("0x0000000000000000000000000000000000000000"),
            Err(DomainError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn cached_balance_is_not_fresh() {
        let balance = Balance::fresh(U256::from(5u8));
        assert!(balance.is_fresh());
        let cached = balance.into_cached();
        assert!(!cached.is_fresh());
        assert_eq!(cached.raw(), U256::from(5u8));
    }
}
