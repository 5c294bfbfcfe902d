//! EVM chain integration over alloy.

pub mod client;
pub mod contracts;
pub mod settings;

pub use client::EvmChain;
pub use settings::EvmRuntimeConfig;
