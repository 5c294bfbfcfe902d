//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`chain`] - In-memory [`Chain`](crate::port::outbound::chain::Chain)
//!   with ERC-20 accounting, pools, positions and split/merge.
//! - [`domain`] - Builders for addresses, proposal tokens and market parameters.

pub mod chain;
pub mod domain;
