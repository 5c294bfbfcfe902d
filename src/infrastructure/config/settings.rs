//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; the signing key comes only from the
//! `WALLET_PRIVATE_KEY` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use futarchy_liquidity::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::Deserialize;
use url::Url;

use super::logging::LoggingConfig;
use super::wallet::{WalletConfig, PRIVATE_KEY_ENV};
use crate::domain::token::parse_address;
use crate::error::{ConfigError, Result};

/// Gnosis Chain, where the futarchy contracts are deployed.
const DEFAULT_CHAIN_ID: u64 = 100;

/// RPC endpoint and the chain it must serve.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

const fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            chain_id: DEFAULT_CHAIN_ID,
        }
    }
}

/// Deployed contract addresses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractsConfig {
    #[serde(default)]
    pub position_manager: String,
    #[serde(default)]
    pub factory: String,
    /// Default conditional token adapter; a proposal file may override it.
    #[serde(default)]
    pub adapter: Option<String>,
}

/// Where run artifacts are written.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default = "default_artifact_dir")]
    pub directory: PathBuf,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("runs")
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            directory: default_artifact_dir(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub output: ArtifactConfig,

    /// Private key is loaded from `WALLET_PRIVATE_KEY` environment variable.
    #[serde(default)]
    pub wallet: WalletConfig,
}

fn required_address(field: &'static str, value: &str) -> Result<Address> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { field }.into());
    }
    parse_address(value).map_err(|e| {
        ConfigError::InvalidValue {
            field,
            reason: e.to_string(),
        }
        .into()
    })
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.wallet.load_private_key();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        self.rpc_url()?;
        if self.chain.chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chain_id",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        self.position_manager()?;
        self.factory()?;
        self.default_adapter()?;
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> Result<Url> {
        if self.chain.rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "rpc_url" }.into());
        }
        Url::parse(self.chain.rpc_url.trim()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "rpc_url",
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn position_manager(&self) -> Result<Address> {
        required_address("position_manager", &self.contracts.position_manager)
    }

    pub fn factory(&self) -> Result<Address> {
        required_address("factory", &self.contracts.factory)
    }

    pub fn default_adapter(&self) -> Result<Option<Address>> {
        self.contracts
            .adapter
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| required_address("adapter", value))
            .transpose()
    }

    /// The signing key, required by every command that touches the chain.
    pub fn private_key(&self) -> Result<&str> {
        self.wallet.private_key.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: PRIVATE_KEY_ENV,
            }
            .into()
        })
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const VALID: &str = r#"
        [chain]
        rpc_url = "https://rpc.gnosischain.com"
        chain_id = 100

        [contracts]
        position_manager = "0x91fd594c46d8b01e62dbdebed2401dde01817834"
        factory = "0xa0864cca6e114013ab0e27cbd5b6f4c8947da766"
    "#;

    #[test]
    fn parses_valid_config_with_defaults() {
        let config = Config::parse_toml(VALID).unwrap();
        assert_eq!(config.chain.chain_id, 100);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.output.directory, PathBuf::from("runs"));
        assert!(config.default_adapter().unwrap().is_none());
    }

    #[test]
    fn missing_rpc_url_is_reported_by_field() {
        let toml = VALID.replace("rpc_url = \"https://rpc.gnosischain.com\"", "");
        let err = Config::parse_toml(&toml).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "rpc_url" })
        ));
    }

    #[test]
    fn malformed_contract_address_is_invalid() {
        let toml = VALID.replace("0xa0864cca6e114013ab0e27cbd5b6f4c8947da766", "0x1234");
        let err = Config::parse_toml(&toml).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "factory",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let toml = format!("{VALID}\n[logging]\nformat = \"xml\"\n");
        assert!(Config::parse_toml(&toml).is_err());
    }
}
