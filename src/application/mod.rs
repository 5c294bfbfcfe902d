//! Application services (use cases).
//!
//! These services orchestrate domain logic over the outbound chain port.

pub mod balance;
pub mod batch;
pub mod liquidity;
pub mod pricing;
pub mod proposal;
pub mod session;
pub mod split_merge;

pub use balance::BalanceVerifier;
pub use batch::{
    BatchOrchestrator, BatchPolicy, RemovalItem, RemovalReport, RunMode, SetupPlan, SetupReport,
};
pub use liquidity::{DepositOutcome, DepositRequest, LiquidityManager, RemovalOutcome, ShortfallCover};
pub use pricing::{PriceEngine, PriceSource, TargetPrice};
pub use session::Session;
pub use split_merge::{MergeOutcome, SplitMergeAccountant, SplitOutcome};
