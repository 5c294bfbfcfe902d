//! Default locations under `~/.futarchy-liquidity/`.
//!
//! - `~/.futarchy-liquidity/config.toml` - chain and contract configuration

use std::path::PathBuf;

/// Returns the home directory (`~/.futarchy-liquidity/`), or `.` when unknown.
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".futarchy-liquidity")
}

/// Returns the default config file path.
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lives_under_home() {
        let config = default_config();
        assert!(config.starts_with(home_dir()));
        assert!(config.ends_with("config.toml"));
    }
}
