//! Liquidity positions, lifecycle states and removal amounts.

use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// On-chain liquidity position as read from the position manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub token_id: U256,
    pub token0: Address,
    pub token1: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl Position {
    #[must_use]
    pub fn has_owed_tokens(&self) -> bool {
        self.tokens_owed0 > 0 || self.tokens_owed1 > 0
    }
}

/// Lifecycle of a single pool position.
///
/// ```text
/// Absent -> Creating -> Initialized -> Liquid -> Decreasing -> Collecting -> Burned
///                                        ^                        |
///                                        +---- partial removal ---+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Absent,
    Creating,
    Initialized,
    Liquid,
    Decreasing,
    Collecting,
    Burned,
}

impl LifecycleState {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Absent, Creating)
                | (Creating, Initialized)
                | (Initialized, Liquid)
                | (Liquid, Liquid)
                | (Liquid, Decreasing)
                | (Decreasing, Collecting)
                | (Collecting, Liquid)
                | (Collecting, Burned)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Initialized => "initialized",
            Self::Liquid => "liquid",
            Self::Decreasing => "decreasing",
            Self::Collecting => "collecting",
            Self::Burned => "burned",
        };
        f.write_str(label)
    }
}

/// Share of a position's liquidity to remove, validated to `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemovalPercentage(u8);

impl RemovalPercentage {
    pub const FULL: Self = Self(100);

    pub fn try_new(percentage: u32) -> Result<Self, DomainError> {
        match u8::try_from(percentage) {
            Ok(value) if (1..=100).contains(&value) => Ok(Self(value)),
            _ => Err(DomainError::InvalidPercentage { percentage }),
        }
    }

    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.0 == 100
    }

    /// Liquidity to remove; a full removal takes exactly all of it.
    #[must_use]
    pub fn of(&self, liquidity: u128) -> u128 {
        if self.is_full() {
            return liquidity;
        }
        let share = U256::from(liquidity) * U256::from(self.0) / U256::from(100u8);
        // share <= liquidity, so it always fits back into u128.
        u128::try_from(share).unwrap_or(liquidity)
    }
}

impl fmt::Display for RemovalPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_bounds() {
        assert!(RemovalPercentage::try_new(0).is_err());
        assert!(RemovalPercentage::try_new(101).is_err());
        assert!(RemovalPercentage::try_new(300).is_err());
        assert_eq!(RemovalPercentage::try_new(1).unwrap().get(), 1);
        assert!(RemovalPercentage::try_new(100).unwrap().is_full());
    }

    #[test]
    fn share_of_liquidity() {
        let half = RemovalPercentage::try_new(50).unwrap();
        assert_eq!(half.of(1_001), 500);
        assert_eq!(RemovalPercentage::FULL.of(1_001), 1_001);
        assert_eq!(half.of(u128::MAX), u128::MAX / 2);
    }

    #[test]
    fn partial_removal_returns_to_liquid() {
        assert!(LifecycleState::Collecting.can_advance_to(LifecycleState::Liquid));
        assert!(LifecycleState::Collecting.can_advance_to(LifecycleState::Burned));
        assert!(!LifecycleState::Liquid.can_advance_to(LifecycleState::Burned));
        assert!(!LifecycleState::Absent.can_advance_to(LifecycleState::Liquid));
    }
}
