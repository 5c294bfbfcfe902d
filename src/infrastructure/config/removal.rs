//! Removal lists for batch position removal.
//!
//! A removal file is either an explicit list of positions or a setup
//! artifact from an earlier run, in which case every pool that recorded a
//! position token id becomes one removal item.

use std::path::Path;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::Deserialize;

use crate::application::batch::RemovalItem;
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TokenIdInput {
    Number(u64),
    Text(String),
}

impl TokenIdInput {
    fn parse(&self) -> Result<U256> {
        match self {
            Self::Number(value) => Ok(U256::from(*value)),
            Self::Text(text) => U256::from_str(text.trim()).map_err(|e| {
                ConfigError::InvalidValue {
                    field: "token_id",
                    reason: format!("'{text}': {e}"),
                }
                .into()
            }),
        }
    }
}

const fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct RemovalEntry {
    token_id: TokenIdInput,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    collect: bool,
    #[serde(default)]
    percentage: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtifactPool {
    #[serde(default)]
    token_id: Option<TokenIdInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RemovalSource {
    List { positions: Vec<RemovalEntry> },
    Artifact { pools: Vec<ArtifactPool> },
}

impl RemovalSource {
    fn into_items(self, default_percentage: u32) -> Result<Vec<RemovalItem>> {
        match self {
            Self::List { positions } => positions
                .into_iter()
                .map(|entry| {
                    Ok(RemovalItem {
                        token_id: entry.token_id.parse()?,
                        enabled: entry.enabled,
                        collect: entry.collect,
                        percentage: entry.percentage.unwrap_or(default_percentage),
                    })
                })
                .collect(),
            Self::Artifact { pools } => pools
                .into_iter()
                .filter_map(|pool| pool.token_id)
                .map(|token_id| {
                    Ok(RemovalItem {
                        token_id: token_id.parse()?,
                        enabled: true,
                        collect: false,
                        percentage: default_percentage,
                    })
                })
                .collect(),
        }
    }
}

/// Parse removal items from JSON content.
///
/// Entries without an explicit percentage use `default_percentage`; the
/// range is checked per item when the run executes.
pub fn parse_json(content: &str, default_percentage: u32) -> Result<Vec<RemovalItem>> {
    let source: RemovalSource = serde_json::from_str(content).map_err(ConfigError::ParseJson)?;
    source.into_items(default_percentage)
}

pub fn parse_toml(content: &str, default_percentage: u32) -> Result<Vec<RemovalItem>> {
    let source: RemovalSource = toml::from_str(content).map_err(ConfigError::Parse)?;
    source.into_items(default_percentage)
}

/// Load removal items, choosing TOML for `.toml` files and JSON otherwise.
pub fn load(path: &Path, default_percentage: u32) -> Result<Vec<RemovalItem>> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        parse_toml(&content, default_percentage)
    } else {
        parse_json(&content, default_percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_defaults_enabled_and_percentage() {
        let items = parse_json(
            r#"{ "positions": [
                { "token_id": 7 },
                { "token_id": "8", "enabled": false },
                { "token_id": "0x09", "collect": true, "percentage": 25 }
            ] }"#,
            100,
        )
        .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].token_id, U256::from(7));
        assert!(items[0].enabled);
        assert_eq!(items[0].percentage, 100);
        assert!(!items[1].enabled);
        assert_eq!(items[2].token_id, U256::from(9));
        assert!(items[2].collect);
        assert_eq!(items[2].percentage, 25);
    }

    #[test]
    fn artifact_pools_with_positions_become_items() {
        let items = parse_json(
            r#"{ "created_at": "2026-01-01T00:00:00Z", "pools": [
                { "index": 1, "token_id": "0x2a", "status": "success" },
                { "index": 2, "token_id": null, "status": "skipped" }
            ] }"#,
            50,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].token_id, U256::from(42));
        assert_eq!(items[0].percentage, 50);
    }

    #[test]
    fn toml_list() {
        let items = parse_toml(
            r#"
            [[positions]]
            token_id = 11
            percentage = 40
            "#,
            100,
        )
        .unwrap();
        assert_eq!(items[0].token_id, U256::from(11));
        assert_eq!(items[0].percentage, 40);
    }

    #[test]
    fn rejects_non_numeric_token_id() {
        assert!(parse_json(r#"{ "positions": [ { "token_id": "abc" } ] }"#, 100).is_err());
    }
}
