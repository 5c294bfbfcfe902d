//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use crate::adapter::outbound::artifact::JsonArtifactStore;
use crate::adapter::outbound::evm::{EvmChain, EvmRuntimeConfig};
use crate::application::session::Session;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Resolve the adapter's connection settings from validated configuration.
pub fn evm_runtime_config(config: &Config) -> Result<EvmRuntimeConfig> {
    Ok(EvmRuntimeConfig {
        private_key: config.private_key()?.to_string(),
        chain_id: config.chain.chain_id,
        rpc_url: config.rpc_url()?,
        position_manager: config.position_manager()?,
        factory: config.factory()?,
    })
}

/// Connect the signing chain client and open a session on it.
pub async fn connect_session(config: &Config) -> Result<Session> {
    let runtime = evm_runtime_config(config)?;
    let chain = EvmChain::connect(&runtime).await?;
    Ok(Session::new(Arc::new(chain)))
}

pub fn artifact_store(config: &Config) -> JsonArtifactStore {
    JsonArtifactStore::new(config.output.directory.clone())
}
