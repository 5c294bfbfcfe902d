//! Resolved connection settings for the EVM adapter.

use alloy_primitives::Address;
use url::Url;

/// Everything [`EvmChain`](super::EvmChain) needs to connect, already validated.
#[derive(Debug, Clone)]
pub struct EvmRuntimeConfig {
    /// Wallet private key (hex, optional 0x prefix).
    pub private_key: String,
    /// Chain id the endpoint must report.
    pub chain_id: u64,
    pub rpc_url: Url,
    pub position_manager: Address,
    pub factory: Address,
}
