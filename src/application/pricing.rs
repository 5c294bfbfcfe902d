//! Target price resolution for pool deposits.
//!
//! A pool that already exists keeps its on-chain price; formula prices only
//! seed pools that are about to be created. Both the preservation read and the
//! post-mint check go through [`PriceEngine::pool_price`], so a pool's logical
//! price is derived by exactly one code path per pair.

use alloy_primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{info, warn};

use super::session::Session;
use crate::domain::error::DomainError;
use crate::domain::pair::{AmmPair, PricePoint};
use crate::domain::price_math::decode_sqrt_price_x96;
use crate::error::Result;

/// Relative divergence above which a read-back price is flagged.
pub const READBACK_TOLERANCE: Decimal = dec!(0.001);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Derived from market parameters for a new pool.
    Formula,
    /// Adopted unchanged from an existing pool.
    Existing,
    /// Implied by explicitly supplied deposit amounts.
    Amounts,
}

/// Price a deposit will be sized against, in logical orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetPrice {
    pub price: PricePoint,
    pub source: PriceSource,
}

pub struct PriceEngine<'a> {
    session: &'a Session,
}

impl<'a> PriceEngine<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Current pool price in the pair's logical orientation (tokenB per tokenA).
    pub async fn pool_price(&self, pair: &AmmPair, pool: Address) -> Result<PricePoint> {
        let (meta0, meta1) = self
            .session
            .token_pair(pair.token0(), pair.token1())
            .await?;
        let state = self.session.chain().pool_state(pool).await?;
        let amm = decode_sqrt_price_x96(state.sqrt_price_x96, meta0.decimals, meta1.decimals)?;
        Ok(pair.to_logical_price(amm)?)
    }

    /// Resolve the deposit price: existing pool price first, then the supplied one.
    pub async fn resolve(
        &self,
        pair: &AmmPair,
        pool: Option<Address>,
        supplied: Option<TargetPrice>,
    ) -> Result<TargetPrice> {
        if let Some(pool) = pool {
            let price = self.pool_price(pair, pool).await?;
            if let Some(supplied) = supplied {
                let drift = price.relative_deviation(&supplied.price);
                if drift > READBACK_TOLERANCE {
                    info!(
                        pool = %pool,
                        existing = %price.value(),
                        supplied = %supplied.price.value(),
                        "Preserving existing pool price over supplied price"
                    );
                }
            }
            return Ok(TargetPrice {
                price,
                source: PriceSource::Existing,
            });
        }

        supplied.ok_or_else(|| {
            DomainError::UnderspecifiedDeposit {
                reason: "new pool needs a price or both deposit amounts",
            }
            .into()
        })
    }

    /// Compare an observed pool price against the intended one.
    ///
    /// Divergence beyond [`READBACK_TOLERANCE`] is logged as a price
    /// inconsistency and returned; it never fails the operation.
    pub fn check_consistency(
        &self,
        pool: Address,
        intended: &PricePoint,
        observed: &PricePoint,
    ) -> Option<Decimal> {
        let drift = observed.relative_deviation(intended);
        if drift > READBACK_TOLERANCE {
            warn!(
                pool = %pool,
                intended = %intended.value(),
                observed = %observed.value(),
                drift = %drift,
                "Price inconsistency after deposit"
            );
            return Some(drift);
        }
        None
    }
}
