//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the chain, artifact storage and operator
//! confirmation the application depends on.

pub mod artifact;
pub mod chain;
pub mod confirm;
