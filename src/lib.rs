//! Futarchy liquidity - conditional-token pool pricing and lifecycle management.
//!
//! This crate derives prices for the six pools of a futarchy proposal from
//! a spot price, an event probability and an expected impact, and drives the
//! liquidity lifecycle of those pools against a deployed concentrated
//! liquidity AMM.
//!
//! # Architecture
//!
//! - **`domain`** - Exchange-agnostic types: token ordering, price math,
//!   market parameters, positions and batch outcomes
//! - **`port`** - Traits the application drives (chain access, artifacts,
//!   confirmations)
//! - **`application`** - Balance verification, pricing, split/merge,
//!   liquidity lifecycle and batch orchestration
//! - **`adapter`** - Alloy-backed chain client, JSON artifact store and CLI
//! - **`infrastructure`** - Configuration loading and bootstrap
//!
//! # Features
//!
//! - `evm` - Enable the alloy chain adapter and the binary (default)
//! - `testkit` - Expose the in-memory [`testkit::MockChain`] to integration tests
//!
//! # Example
//!
//! ```
//! use futarchy_liquidity::domain::market::MarketParameters;
//! use rust_decimal_macros::dec;
//!
//! let params = MarketParameters::try_new(dec!(100), dec!(0.5), dec!(0.10)).unwrap();
//! let prices = params.conditional_prices().unwrap();
//! assert_eq!(prices.yes, dec!(105));
//! assert_eq!(prices.no, dec!(95));
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
