//! Outbound adapters (driven side).

pub mod artifact;
#[cfg(feature = "evm")]
pub mod evm;
