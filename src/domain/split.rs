//! Split and merge accounting for conditional tokens.

use alloy_primitives::{Address, U256};
use serde::Serialize;

/// `max(0, need - have)`.
#[must_use]
pub fn shortfall(need: U256, have: U256) -> U256 {
    need.saturating_sub(have)
}

/// Planned split of collateral into conditional tokens to cover a shortfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitOperation {
    pub conditional_token: Address,
    pub underlying_token: Address,
    pub amount_needed: U256,
    pub amount_have: U256,
    pub amount_to_split: U256,
}

impl SplitOperation {
    #[must_use]
    pub fn plan(
        conditional_token: Address,
        underlying_token: Address,
        amount_needed: U256,
        amount_have: U256,
    ) -> Self {
        Self {
            conditional_token,
            underlying_token,
            amount_needed,
            amount_have,
            amount_to_split: shortfall(amount_needed, amount_have),
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.amount_to_split.is_zero()
    }
}

/// Mergeable amount of a matched YES/NO pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergePlan {
    pub collateral_token: Address,
    pub yes_token: Address,
    pub no_token: Address,
    pub yes_balance: U256,
    pub no_balance: U256,
    pub mergeable: U256,
}

impl MergePlan {
    #[must_use]
    pub fn plan(
        collateral_token: Address,
        yes_token: Address,
        no_token: Address,
        yes_balance: U256,
        no_balance: U256,
    ) -> Self {
        Self {
            collateral_token,
            yes_token,
            no_token,
            yes_balance,
            no_balance,
            mergeable: yes_balance.min(no_balance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn shortfall_never_negative() {
        assert_eq!(shortfall(u(10), u(3)), u(7));
        assert_eq!(shortfall(u(3), u(10)), U256::ZERO);
        assert_eq!(shortfall(u(5), u(5)), U256::ZERO);
    }

    #[test]
    fn split_plan_is_noop_when_covered() {
        let a = Address::with_last_byte(1);
        let b = Address::with_last_byte(2);
        assert!(SplitOperation::plan(a, b, u(100), u(100)).is_noop());
        assert!(SplitOperation::plan(a, b, u(100), u(250)).is_noop());
        let op = SplitOperation::plan(a, b, u(100), u(40));
        assert_eq!(op.amount_to_split, u(60));
    }

    #[test]
    fn mergeable_is_the_smaller_side() {
        let plan = MergePlan::plan(
            Address::with_last_byte(1),
            Address::with_last_byte(2),
            Address::with_last_byte(3),
            u(120),
            u(80),
        );
        assert_eq!(plan.mergeable, u(80));
    }
}
