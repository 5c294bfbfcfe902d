//! Exchange-agnostic domain logic.

pub mod amount;
pub mod error;
pub mod market;
pub mod outcome;
pub mod pair;
pub mod pool;
pub mod position;
pub mod price_math;
pub mod split;
pub mod token;
pub mod transaction;

pub use market::{ConditionalPrices, MarketParameters};
pub use outcome::{BatchResult, BatchSummary, ItemOutcome, ItemStatus};
pub use pair::{AmmPair, AmmSlot, LogicalPair, Orientation, PricePoint};
pub use pool::{PoolKind, PoolSpec, PoolTemplate, PriceFormula, ProposalTokens};
pub use position::{LifecycleState, Position, RemovalPercentage};
pub use split::{MergePlan, SplitOperation};
pub use token::{Balance, Freshness, TokenMeta};
pub use transaction::{TxRecord, TxStep};
