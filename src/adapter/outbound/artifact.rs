//! Run artifacts as timestamped JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::port::outbound::artifact::ArtifactStore;

/// Writes `{dir}/{kind}_{timestamp}.json`, creating `dir` on demand.
pub struct JsonArtifactStore {
    dir: PathBuf,
}

impl JsonArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for JsonArtifactStore {
    fn save(&self, kind: &str, body: &serde_json::Value) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let path = self.dir.join(format!("{kind}_{stamp}.json"));
        let contents = serde_json::to_string_pretty(body)?;
        fs::write(&path, contents)?;
        debug!(path = %path.display(), "Wrote artifact");
        Ok(path)
    }
}
