//! Declarative batch runs: the six-pool setup and multi-position removal.
//!
//! Each item is folded into an [`ItemOutcome`] so a failing pool never
//! aborts the rest of the run unless `stop_on_error` is set.

use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::liquidity::{DepositOutcome, DepositRequest, LiquidityManager, RemovalOutcome, ShortfallCover};
use super::pricing::PriceSource;
use super::proposal::load_proposal_tokens;
use super::session::Session;
use super::split_merge::SplitMergeAccountant;
use crate::domain::market::{ConditionalPrices, MarketParameters};
use crate::domain::outcome::{BatchResult, BatchSummary, ItemOutcome, ItemStatus};
use crate::domain::pair::{AmmPair, AmmSlot};
use crate::domain::pool::{derive_pool_specs, PoolKind, PoolSpec, ProposalTokens, POOL_COUNT};
use crate::domain::position::RemovalPercentage;
use crate::domain::transaction::TxRecord;
use crate::error::{Error, Result};
use crate::port::outbound::artifact::ArtifactStore;
use crate::port::outbound::confirm::Confirmer;

/// Everything a setup run needs, already validated.
#[derive(Debug, Clone)]
pub struct SetupPlan {
    pub proposal: Address,
    pub adapter: Address,
    pub params: MarketParameters,
    /// Deposit of each pool's logical first token, by table position.
    pub amounts: [Decimal; POOL_COUNT],
    /// 1-based pool indices that receive liquidity even when the pool exists.
    pub force_add_liquidity: Vec<usize>,
    pub skip_existing_pools: bool,
}

impl SetupPlan {
    fn forces(&self, index: usize) -> bool {
        self.force_add_liquidity.contains(&index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Auto,
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub mode: RunMode,
    pub stop_on_error: bool,
}

impl BatchPolicy {
    pub const fn auto() -> Self {
        Self {
            mode: RunMode::Auto,
            stop_on_error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRole {
    pub address: Address,
    pub symbol: Option<String>,
}

/// Persisted record of one setup pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolRecord {
    pub index: usize,
    pub name: &'static str,
    pub kind: PoolKind,
    pub pool_address: Option<Address>,
    pub token0: TokenRole,
    pub token1: TokenRole,
    /// AMM slot of the logical first token, present only when the pair is inverted.
    pub inverted_slot: Option<AmmSlot>,
    /// Logical price (tokenB per tokenA) the deposit was sized against.
    pub price: Option<Decimal>,
    pub price_source: Option<PriceSource>,
    pub amount0: Option<U256>,
    pub amount1: Option<U256>,
    pub token_id: Option<U256>,
    pub status: ItemStatus,
    pub detail: String,
    pub transactions: Vec<TxRecord>,
}

impl PoolRecord {
    fn new(spec: &PoolSpec, pair: Option<&AmmPair>) -> Self {
        let (token0, token1) = match pair {
            Some(pair) => (pair.token0(), pair.token1()),
            None => (spec.logical_t0, spec.logical_t1),
        };
        Self {
            index: spec.index,
            name: spec.name,
            kind: spec.kind,
            pool_address: None,
            token0: TokenRole {
                address: token0,
                symbol: None,
            },
            token1: TokenRole {
                address: token1,
                symbol: None,
            },
            inverted_slot: pair
                .filter(|pair| pair.is_inverted())
                .map(AmmPair::slot_of_a),
            price: None,
            price_source: None,
            amount0: None,
            amount1: None,
            token_id: None,
            status: ItemStatus::Skipped,
            detail: String::new(),
            transactions: Vec::new(),
        }
    }

    fn apply(&mut self, outcome: ItemOutcome<DepositOutcome>) {
        self.status = outcome.status();
        match outcome {
            ItemOutcome::Success(deposit) => {
                self.detail = if deposit.created_pool {
                    "pool created and liquidity added".to_string()
                } else {
                    "liquidity added".to_string()
                };
                self.pool_address = Some(deposit.pool);
                self.price = Some(deposit.target.price.value());
                self.price_source = Some(deposit.target.source);
                self.amount0 = Some(deposit.amount0);
                self.amount1 = Some(deposit.amount1);
                self.token_id = Some(deposit.token_id);
                self.transactions = deposit.transactions;
            }
            ItemOutcome::Skipped(reason) | ItemOutcome::Failed(reason) => self.detail = reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub created_at: DateTime<Utc>,
    pub proposal: Address,
    pub adapter: Address,
    pub params: MarketParameters,
    pub conditional_prices: ConditionalPrices,
    pub tokens: ProposalTokens,
    pub pools: Vec<PoolRecord>,
    pub summary: BatchSummary,
    #[serde(skip)]
    pub artifact: Option<PathBuf>,
}

impl SetupReport {
    pub fn results(&self) -> Vec<BatchResult> {
        self.pools
            .iter()
            .map(|pool| BatchResult {
                item_id: format!("{} {}", pool.index, pool.name),
                status: pool.status,
                detail: pool.detail.clone(),
            })
            .collect()
    }
}

/// One entry of a removal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalItem {
    pub token_id: U256,
    pub enabled: bool,
    /// Collect owed tokens only, leaving liquidity untouched.
    pub collect: bool,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalRecord {
    pub token_id: U256,
    pub percentage: u32,
    pub collect_only: bool,
    pub removed_liquidity: Option<u128>,
    pub remaining_liquidity: Option<u128>,
    pub status: ItemStatus,
    pub detail: String,
    pub transactions: Vec<TxRecord>,
}

impl RemovalRecord {
    fn from_outcome(item: &RemovalItem, outcome: ItemOutcome<RemovalOutcome>) -> Self {
        let mut record = Self {
            token_id: item.token_id,
            percentage: item.percentage,
            collect_only: item.collect,
            removed_liquidity: None,
            remaining_liquidity: None,
            status: outcome.status(),
            detail: String::new(),
            transactions: Vec::new(),
        };
        match outcome {
            ItemOutcome::Success(removal) => {
                record.detail = format!("position {}", removal.state);
                record.removed_liquidity = Some(removal.removed_liquidity);
                record.remaining_liquidity = Some(removal.remaining_liquidity);
                record.transactions = removal.transactions;
            }
            ItemOutcome::Skipped(reason) | ItemOutcome::Failed(reason) => record.detail = reason,
        }
        record
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    pub created_at: DateTime<Utc>,
    pub positions: Vec<RemovalRecord>,
    pub summary: BatchSummary,
    #[serde(skip)]
    pub artifact: Option<PathBuf>,
}

impl RemovalReport {
    pub fn results(&self) -> Vec<BatchResult> {
        self.positions
            .iter()
            .map(|position| BatchResult {
                item_id: position.token_id.to_string(),
                status: position.status,
                detail: position.detail.clone(),
            })
            .collect()
    }
}

/// Fold an operation result into a batch outcome.
///
/// Positions owned by another wallet are skipped rather than failed.
fn fold<T>(result: Result<T>) -> ItemOutcome<T> {
    match result {
        Ok(value) => ItemOutcome::Success(value),
        Err(e) if e.is_ownership_mismatch() => ItemOutcome::Skipped(e.to_string()),
        Err(e) => ItemOutcome::Failed(e.to_string()),
    }
}

pub struct BatchOrchestrator<'a> {
    session: &'a Session,
    confirmer: &'a dyn Confirmer,
    store: Option<&'a dyn ArtifactStore>,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(session: &'a Session, confirmer: &'a dyn Confirmer) -> Self {
        Self {
            session,
            confirmer,
            store: None,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: &'a dyn ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Derive the six pools of a proposal and add liquidity to each.
    ///
    /// # Errors
    ///
    /// Fails before any pool is touched when the proposal tokens cannot be
    /// read or the conditional prices fail their conservation check.
    pub async fn run_setup(&self, plan: &SetupPlan, policy: BatchPolicy) -> Result<SetupReport> {
        let tokens = load_proposal_tokens(self.session.chain(), plan.proposal).await?;
        let prices = plan.params.conditional_prices()?;
        info!(
            proposal = %plan.proposal,
            yes_price = %prices.yes,
            no_price = %prices.no,
            "Starting pool setup"
        );

        let accountant = SplitMergeAccountant::new(self.session, plan.adapter, plan.proposal);
        let manager = LiquidityManager::new(self.session)
            .with_cover(ShortfallCover::new(accountant, tokens));

        let mut summary = BatchSummary::default();
        let mut pools = Vec::with_capacity(POOL_COUNT);
        for spec in derive_pool_specs(&tokens) {
            let record = self
                .setup_pool(&manager, plan, policy, &spec, &prices)
                .await;
            summary.record(record.status);
            let failed = record.status == ItemStatus::Failed;
            pools.push(record);
            if failed && policy.stop_on_error {
                warn!(pool = spec.name, "Stopping setup after failure");
                summary.halted = true;
                break;
            }
        }

        let mut report = SetupReport {
            created_at: Utc::now(),
            proposal: plan.proposal,
            adapter: plan.adapter,
            params: plan.params,
            conditional_prices: prices,
            tokens,
            pools,
            summary,
            artifact: None,
        };
        report.artifact = self.persist("setup", &report);
        info!(
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped,
            "Pool setup finished"
        );
        Ok(report)
    }

    async fn setup_pool(
        &self,
        manager: &LiquidityManager<'_>,
        plan: &SetupPlan,
        policy: BatchPolicy,
        spec: &PoolSpec,
        prices: &ConditionalPrices,
    ) -> PoolRecord {
        let pair = match AmmPair::normalize(spec.logical_t0, spec.logical_t1) {
            Ok(pair) => pair,
            Err(e) => {
                let mut record = PoolRecord::new(spec, None);
                record.apply(ItemOutcome::Failed(e.to_string()));
                return record;
            }
        };
        let mut record = PoolRecord::new(spec, Some(&pair));
        if let Ok((meta0, meta1)) = self.session.token_pair(pair.token0(), pair.token1()).await {
            record.token0.symbol = Some(meta0.symbol);
            record.token1.symbol = Some(meta1.symbol);
        }

        let outcome = self.decide_pool(manager, plan, policy, spec, &pair, prices).await;
        match &outcome {
            ItemOutcome::Success(deposit) => info!(
                pool = spec.name,
                token_id = %deposit.token_id,
                "Pool setup succeeded"
            ),
            ItemOutcome::Skipped(reason) => info!(pool = spec.name, reason = %reason, "Pool skipped"),
            ItemOutcome::Failed(reason) => warn!(pool = spec.name, error = %reason, "Pool setup failed"),
        }
        record.apply(outcome);
        record
    }

    async fn decide_pool(
        &self,
        manager: &LiquidityManager<'_>,
        plan: &SetupPlan,
        policy: BatchPolicy,
        spec: &PoolSpec,
        pair: &AmmPair,
        prices: &ConditionalPrices,
    ) -> ItemOutcome<DepositOutcome> {
        let existing = match self
            .session
            .chain()
            .pool_by_pair(pair.token0(), pair.token1())
            .await
        {
            Ok(existing) => existing,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };

        match policy.mode {
            RunMode::Auto => {
                if existing.is_some() && plan.skip_existing_pools && !plan.forces(spec.index) {
                    return ItemOutcome::Skipped("pool already exists".to_string());
                }
            }
            RunMode::Interactive => {
                let prompt = match existing {
                    Some(pool) => format!("Add liquidity to existing pool {} ({pool})?", spec.name),
                    None => format!("Create pool {} and add liquidity?", spec.name),
                };
                match self.confirmer.confirm(&prompt) {
                    Ok(true) => {}
                    Ok(false) => return ItemOutcome::Skipped("declined".to_string()),
                    Err(e) => return ItemOutcome::Failed(e.to_string()),
                }
            }
        }

        let price = match spec.formula_price(&plan.params, prices) {
            Ok(price) => price,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };
        let request = DepositRequest {
            pair: *pair,
            amount_a: Some(plan.amounts[spec.index - 1]),
            amount_b: None,
            price: Some(price),
        };
        fold(manager.provide(&request).await)
    }

    /// Apply a removal list, one position at a time.
    pub async fn run_removal(&self, items: &[RemovalItem], policy: BatchPolicy) -> RemovalReport {
        let manager = LiquidityManager::new(self.session);
        let mut summary = BatchSummary::default();
        let mut positions = Vec::with_capacity(items.len());

        for item in items {
            let outcome = self.remove_item(&manager, item, policy).await;
            let status = outcome.status();
            match &outcome {
                ItemOutcome::Failed(reason) => {
                    warn!(token_id = %item.token_id, error = %reason, "Position removal failed");
                }
                ItemOutcome::Skipped(reason) => {
                    info!(token_id = %item.token_id, reason = %reason, "Position skipped");
                }
                ItemOutcome::Success(_) => {}
            }
            summary.record(status);
            positions.push(RemovalRecord::from_outcome(item, outcome));
            if status == ItemStatus::Failed && policy.stop_on_error {
                summary.halted = true;
                break;
            }
        }

        let mut report = RemovalReport {
            created_at: Utc::now(),
            positions,
            summary,
            artifact: None,
        };
        report.artifact = self.persist("removal", &report);
        report
    }

    async fn remove_item(
        &self,
        manager: &LiquidityManager<'_>,
        item: &RemovalItem,
        policy: BatchPolicy,
    ) -> ItemOutcome<RemovalOutcome> {
        if !item.enabled {
            return ItemOutcome::Skipped("disabled".to_string());
        }
        if policy.mode == RunMode::Interactive {
            let prompt = if item.collect {
                format!("Collect fees of position {}?", item.token_id)
            } else {
                format!("Remove {}% of position {}?", item.percentage, item.token_id)
            };
            match self.confirmer.confirm(&prompt) {
                Ok(true) => {}
                Ok(false) => return ItemOutcome::Skipped("declined".to_string()),
                Err(e) => return ItemOutcome::Failed(e.to_string()),
            }
        }

        if item.collect {
            return fold(manager.collect_fees(item.token_id).await);
        }
        match RemovalPercentage::try_new(item.percentage) {
            Ok(percentage) => fold(manager.remove(item.token_id, percentage).await),
            Err(e) => ItemOutcome::Failed(Error::from(e).to_string()),
        }
    }

    fn persist<T: Serialize>(&self, kind: &str, report: &T) -> Option<PathBuf> {
        let store = self.store?;
        let saved = serde_json::to_value(report)
            .map_err(Error::from)
            .and_then(|body| store.save(kind, &body));
        match saved {
            Ok(path) => {
                info!(path = %path.display(), "Saved run artifact");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save run artifact");
                None
            }
        }
    }
}
