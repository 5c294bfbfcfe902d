//! Liquidity lifecycle for a single pool position.
//!
//! Every step is confirmed before the next one starts, balances are re-read
//! immediately before each mutating call, and the confirmed transactions are
//! returned to the caller in order.

use alloy_primitives::{Address, U256};
use futures_util::future::try_join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use super::balance::BalanceVerifier;
use super::pricing::{PriceEngine, PriceSource, TargetPrice};
use super::session::Session;
use super::split_merge::SplitMergeAccountant;
use crate::domain::amount::to_units;
use crate::domain::error::DomainError;
use crate::domain::pair::{AmmPair, PricePoint};
use crate::domain::pool::ProposalTokens;
use crate::domain::position::{LifecycleState, Position, RemovalPercentage};
use crate::domain::price_math::{encode_sqrt_price_x96, full_range_ticks};
use crate::domain::token::canonical;
use crate::domain::transaction::{TxRecord, TxStep};
use crate::error::{LiquidityError, Result};
use crate::port::outbound::chain::MintParams;

/// A deposit described in the caller's logical order.
///
/// At least one amount is required; the other side is derived from the
/// existing pool price, or from `price` when the pool does not exist yet.
#[derive(Debug, Clone, Copy)]
pub struct DepositRequest {
    pub pair: AmmPair,
    pub amount_a: Option<Decimal>,
    pub amount_b: Option<Decimal>,
    pub price: Option<PricePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositOutcome {
    pub pool: Address,
    pub token_id: U256,
    pub liquidity: u128,
    /// Deposited raw amounts in AMM order.
    pub amount0: U256,
    pub amount1: U256,
    pub target: TargetPrice,
    pub observed_price: PricePoint,
    /// Relative read-back drift, set only when it exceeds the tolerance.
    pub price_drift: Option<Decimal>,
    pub created_pool: bool,
    pub state: LifecycleState,
    pub transactions: Vec<TxRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalOutcome {
    pub token_id: U256,
    pub removed_liquidity: u128,
    pub remaining_liquidity: u128,
    pub state: LifecycleState,
    pub transactions: Vec<TxRecord>,
}

/// Splits collateral when a deposit is short on a conditional token.
pub struct ShortfallCover<'a> {
    accountant: SplitMergeAccountant<'a>,
    tokens: ProposalTokens,
}

impl<'a> ShortfallCover<'a> {
    pub fn new(accountant: SplitMergeAccountant<'a>, tokens: ProposalTokens) -> Self {
        Self { accountant, tokens }
    }
}

/// Derive the missing side of a logical deposit from `price` (tokenB per tokenA).
pub fn deposit_amounts(
    amount_a: Option<Decimal>,
    amount_b: Option<Decimal>,
    price: Decimal,
) -> std::result::Result<(Decimal, Decimal), DomainError> {
    let overflow = DomainError::Overflow {
        context: "deposit amounts",
    };
    match (amount_a, amount_b) {
        (Some(a), Some(b)) => Ok((a, b)),
        (Some(a), None) => Ok((a, a.checked_mul(price).ok_or(overflow)?)),
        (None, Some(b)) => Ok((b.checked_div(price).ok_or(overflow)?, b)),
        (None, None) => Err(DomainError::UnderspecifiedDeposit {
            reason: "no deposit amount given",
        }),
    }
}

fn advance(state: &mut LifecycleState, next: LifecycleState) {
    debug_assert!(
        state.can_advance_to(next),
        "illegal lifecycle transition {state} -> {next}"
    );
    *state = next;
}

pub struct LiquidityManager<'a> {
    session: &'a Session,
    cover: Option<ShortfallCover<'a>>,
}

impl<'a> LiquidityManager<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            cover: None,
        }
    }

    /// Enable splitting collateral for conditional-token shortfalls.
    #[must_use]
    pub fn with_cover(mut self, cover: ShortfallCover<'a>) -> Self {
        self.cover = Some(cover);
        self
    }

    /// Create the pool if needed and mint a full-range position.
    pub async fn provide(&self, request: &DepositRequest) -> Result<DepositOutcome> {
        let chain = self.session.chain();
        let pair = request.pair;
        let pricing = PriceEngine::new(self.session);
        let verifier = BalanceVerifier::new(self.session);

        let (meta0, meta1) = self
            .session
            .token_pair(pair.token0(), pair.token1())
            .await?;
        let existing = chain.pool_by_pair(pair.token0(), pair.token1()).await?;
        let mut state = if existing.is_some() {
            LifecycleState::Initialized
        } else {
            LifecycleState::Absent
        };

        let supplied = match (request.price, request.amount_a, request.amount_b) {
            (Some(price), _, _) => Some(TargetPrice {
                price,
                source: PriceSource::Formula,
            }),
            (None, Some(a), Some(b)) if !a.is_zero() => Some(TargetPrice {
                price: PricePoint::logical(b / a)?,
                source: PriceSource::Amounts,
            }),
            _ => None,
        };
        let target = pricing.resolve(&pair, existing, supplied).await?;

        // An initialized pool fixes the ratio; only the first amount is honored.
        let amount_b_hint = match (target.source, request.amount_a) {
            (PriceSource::Existing, Some(_)) => None,
            _ => request.amount_b,
        };
        let (amount_a, amount_b) =
            deposit_amounts(request.amount_a, amount_b_hint, target.price.value())?;
        let (meta_a, meta_b) = pair.to_logical_order(&meta0, &meta1);
        let raw_a = to_units(amount_a, meta_a.decimals)?;
        let raw_b = to_units(amount_b, meta_b.decimals)?;
        let (amount0, amount1) = pair.to_amm_order(raw_a, raw_b);
        debug!(
            token0 = %meta0.label(),
            token1 = %meta1.label(),
            amount0 = %amount0,
            amount1 = %amount1,
            inverted = pair.is_inverted(),
            "Computed deposit amounts"
        );

        let mut transactions = Vec::new();
        transactions.extend(self.ensure_funds(pair.token0(), amount0).await?);
        transactions.extend(self.ensure_funds(pair.token1(), amount1).await?);

        let pool = match existing {
            Some(pool) => pool,
            None => {
                advance(&mut state, LifecycleState::Creating);
                let sqrt_price_x96 = encode_sqrt_price_x96(amount0, amount1)?;
                self.session.invalidate_balances();
                let tx_hash = chain
                    .create_and_initialize_pool(pair.token0(), pair.token1(), sqrt_price_x96)
                    .await?;
                info!(
                    token0 = %meta0.label(),
                    token1 = %meta1.label(),
                    sqrt_price_x96 = %sqrt_price_x96,
                    tx_hash = %tx_hash,
                    "Pool created"
                );
                transactions.push(TxRecord::new(TxStep::CreatePool, tx_hash));
                let pool = chain
                    .pool_by_pair(pair.token0(), pair.token1())
                    .await?
                    .ok_or_else(|| LiquidityError::PoolNotFound {
                        token0: canonical(pair.token0()),
                        token1: canonical(pair.token1()),
                    })?;
                advance(&mut state, LifecycleState::Initialized);
                pool
            }
        };

        let spender = chain.position_manager_address();
        for (token, amount) in [(pair.token0(), amount0), (pair.token1(), amount1)] {
            if let Some(tx) = verifier.ensure_allowance(token, spender, amount).await? {
                transactions.push(tx);
            }
        }

        let pool_state = chain.pool_state(pool).await?;
        let (tick_lower, tick_upper) = full_range_ticks(pool_state.tick_spacing)?;

        tokio::try_join!(
            verifier.require(pair.token0(), amount0),
            verifier.require(pair.token1(), amount1)
        )?;
        self.session.invalidate_balances();
        let params = MintParams {
            token0: pair.token0(),
            token1: pair.token1(),
            tick_lower,
            tick_upper,
            amount0_desired: amount0,
            amount1_desired: amount1,
            amount0_min: U256::ZERO,
            amount1_min: U256::ZERO,
            recipient: self.session.owner(),
        };
        let receipt = chain.mint(&params).await?;
        advance(&mut state, LifecycleState::Liquid);
        transactions.push(TxRecord::new(TxStep::Mint, receipt.tx_hash.clone()));

        let position = chain.position(receipt.token_id).await?;
        info!(
            pool = %pool,
            token_id = %receipt.token_id,
            liquidity = position.liquidity,
            tx_hash = %receipt.tx_hash,
            "Position minted"
        );

        let observed_price = pricing.pool_price(&pair, pool).await?;
        let price_drift = pricing.check_consistency(pool, &target.price, &observed_price);

        Ok(DepositOutcome {
            pool,
            token_id: receipt.token_id,
            liquidity: position.liquidity,
            amount0,
            amount1,
            target,
            observed_price,
            price_drift,
            created_pool: existing.is_none(),
            state,
            transactions,
        })
    }

    /// Cover a balance gap by splitting collateral, or fail with the exact shortfall.
    async fn ensure_funds(&self, token: Address, need: U256) -> Result<Vec<TxRecord>> {
        let verifier = BalanceVerifier::new(self.session);
        let have = verifier.have(token).await?;
        if have.raw() >= need {
            return Ok(Vec::new());
        }

        let mut transactions = Vec::new();
        if let Some(cover) = &self.cover {
            if let Some(underlying) = cover.tokens.underlying_of(token) {
                let outcome = cover
                    .accountant
                    .split_for_shortfall(token, underlying, need)
                    .await?;
                transactions = outcome.transactions;
            }
        }
        verifier.require(token, need).await?;
        Ok(transactions)
    }

    async fn verify_ownership(&self, token_id: U256) -> Result<()> {
        let owner = self.session.chain().owner_of(token_id).await?;
        let caller = self.session.owner();
        if owner != caller {
            return Err(LiquidityError::OwnershipMismatch {
                token_id: token_id.to_string(),
                owner: canonical(owner),
                caller: canonical(caller),
            }
            .into());
        }
        Ok(())
    }

    /// Remove a share of a position's liquidity and collect what it owes.
    ///
    /// A full removal chains decrease, collect and burn; a partial one stops
    /// after collect and leaves the position liquid.
    pub async fn remove(
        &self,
        token_id: U256,
        percentage: RemovalPercentage,
    ) -> Result<RemovalOutcome> {
        let chain = self.session.chain();
        self.verify_ownership(token_id).await?;
        let position = chain.position(token_id).await?;
        let mut state = LifecycleState::Liquid;
        let mut transactions = Vec::new();

        let removed = percentage.of(position.liquidity);
        advance(&mut state, LifecycleState::Decreasing);
        if removed > 0 {
            self.session.invalidate_balances();
            let tx_hash = chain.decrease_liquidity(token_id, removed).await?;
            info!(
                token_id = %token_id,
                liquidity = removed,
                percentage = %percentage,
                tx_hash = %tx_hash,
                "Liquidity decreased"
            );
            transactions.push(TxRecord::new(TxStep::Decrease, tx_hash));
        }

        advance(&mut state, LifecycleState::Collecting);
        transactions.push(self.collect_owed(token_id).await?);

        let after = chain.position(token_id).await?;
        if percentage.is_full() {
            if after.liquidity != 0 {
                return Err(LiquidityError::ResidualLiquidity {
                    token_id: token_id.to_string(),
                    liquidity: after.liquidity,
                }
                .into());
            }
            self.session.invalidate_balances();
            let tx_hash = chain.burn(token_id).await?;
            info!(token_id = %token_id, tx_hash = %tx_hash, "Position burned");
            transactions.push(TxRecord::new(TxStep::Burn, tx_hash));
            advance(&mut state, LifecycleState::Burned);
        } else {
            advance(&mut state, LifecycleState::Liquid);
        }

        Ok(RemovalOutcome {
            token_id,
            removed_liquidity: removed,
            remaining_liquidity: after.liquidity,
            state,
            transactions,
        })
    }

    /// Collect owed tokens without touching liquidity.
    pub async fn collect_fees(&self, token_id: U256) -> Result<RemovalOutcome> {
        self.verify_ownership(token_id).await?;
        let tx = self.collect_owed(token_id).await?;
        let position = self.session.chain().position(token_id).await?;
        Ok(RemovalOutcome {
            token_id,
            removed_liquidity: 0,
            remaining_liquidity: position.liquidity,
            state: LifecycleState::Liquid,
            transactions: vec![tx],
        })
    }

    async fn collect_owed(&self, token_id: U256) -> Result<TxRecord> {
        self.session.invalidate_balances();
        let tx_hash = self
            .session
            .chain()
            .collect(token_id, self.session.owner())
            .await?;
        info!(token_id = %token_id, tx_hash = %tx_hash, "Fees collected");
        Ok(TxRecord::new(TxStep::Collect, tx_hash))
    }

    /// Positions owned by the session wallet, by enumeration index.
    pub async fn owned_positions(&self) -> Result<Vec<Position>> {
        let chain = self.session.chain();
        let owner = self.session.owner();
        let count = chain.position_count(owner).await?;
        let ids = try_join_all((0..count).map(|index| chain.token_of_owner_by_index(owner, index)))
            .await?;
        try_join_all(ids.into_iter().map(|id| chain.position(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn derives_missing_side_from_price() {
        assert_eq!(
            deposit_amounts(Some(dec!(10)), None, dec!(105)).unwrap(),
            (dec!(10), dec!(1050))
        );
        assert_eq!(
            deposit_amounts(None, Some(dec!(1050)), dec!(105)).unwrap(),
            (dec!(10), dec!(1050))
        );
    }

    #[test]
    fn explicit_amounts_pass_through() {
        assert_eq!(
            deposit_amounts(Some(dec!(3)), Some(dec!(7)), dec!(105)).unwrap(),
            (dec!(3), dec!(7))
        );
    }

    #[test]
    fn requires_at_least_one_side() {
        assert!(matches!(
            deposit_amounts(None, None, dec!(1)),
            Err(DomainError::UnderspecifiedDeposit { .. })
        ));
    }
}
