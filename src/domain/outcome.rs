//! Per-item outcomes and run summaries for batch operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tagged result of one batch item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    Success(T),
    Skipped(String),
    Failed(String),
}

impl<T> ItemOutcome<T> {
    #[must_use]
    pub fn status(&self) -> ItemStatus {
        match self {
            Self::Success(_) => ItemStatus::Success,
            Self::Skipped(_) => ItemStatus::Skipped,
            Self::Failed(_) => ItemStatus::Failed,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Flattened record of one item, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub item_id: String,
    pub status: ItemStatus,
    pub detail: String,
}

/// Counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    /// True when `stop_on_error` cut the run short.
    #[serde(default)]
    pub halted: bool,
}

impl BatchSummary {
    pub fn record(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Success => self.successful += 1,
            ItemStatus::Failed => self.failed += 1,
            ItemStatus::Skipped => self.skipped += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_each_status() {
        let mut summary = BatchSummary::default();
        for outcome in [
            ItemOutcome::Success(()),
            ItemOutcome::Failed("boom".into()),
            ItemOutcome::Skipped("exists".into()),
            ItemOutcome::Success(()),
        ] {
            summary.record(outcome.status());
        }
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total(), 4);
    }
}
