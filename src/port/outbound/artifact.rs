//! Run artifact persistence port.

use std::path::PathBuf;

use crate::error::Result;

/// Persists a run's result document for audit and manual resume.
pub trait ArtifactStore: Send + Sync {
    /// Save `body` under a timestamped name prefixed with `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be serialized or written.
    fn save(&self, kind: &str, body: &serde_json::Value) -> Result<PathBuf>;
}
