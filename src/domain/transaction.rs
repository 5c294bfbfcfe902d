//! Confirmed transaction records returned by value-moving operations.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStep {
    Approve,
    Split,
    Merge,
    CreatePool,
    Mint,
    Decrease,
    Collect,
    Burn,
}

impl TxStep {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Split => "split",
            Self::Merge => "merge",
            Self::CreatePool => "create_pool",
            Self::Mint => "mint",
            Self::Decrease => "decrease",
            Self::Collect => "collect",
            Self::Burn => "burn",
        }
    }
}

impl fmt::Display for TxStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub step: TxStep,
    pub tx_hash: String,
}

impl TxRecord {
    pub fn new(step: TxStep, tx_hash: impl Into<String>) -> Self {
        Self {
            step,
            tx_hash: tx_hash.into(),
        }
    }
}

/// Steps of a transaction list, in order.
#[must_use]
pub fn steps(records: &[TxRecord]) -> Vec<TxStep> {
    records.iter().map(|r| r.step).collect()
}
