//! Wallet configuration for signing transactions.

use serde::Deserialize;

/// Environment variable holding the signing key.
pub const PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";

/// Wallet configuration.
/// Private key is loaded from `WALLET_PRIVATE_KEY` env var at runtime (never from config file).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    #[serde(skip)]
    pub private_key: Option<String>,
}

impl WalletConfig {
    /// Read the private key from the environment, treating blank values as unset.
    pub fn load_private_key(&mut self) {
        self.private_key = std::env::var(PRIVATE_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
    }
}
