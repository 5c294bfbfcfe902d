//! Collateral split and YES/NO merge accounting.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use tracing::{info, warn};

use super::balance::BalanceVerifier;
use super::session::Session;
use crate::domain::pool::ProposalTokens;
use crate::domain::split::{shortfall, MergePlan, SplitOperation};
use crate::domain::transaction::{TxRecord, TxStep};
use crate::error::{LiquidityError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct SplitOutcome {
    pub operation: SplitOperation,
    /// Shortfall still present after the split; non-zero only for rounding dust.
    pub residual: U256,
    pub transactions: Vec<TxRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub plan: MergePlan,
    pub merged: bool,
    pub transactions: Vec<TxRecord>,
}

/// Splits and merges conditional tokens through the proposal's adapter.
pub struct SplitMergeAccountant<'a> {
    session: &'a Session,
    adapter: Address,
    proposal: Address,
}

impl<'a> SplitMergeAccountant<'a> {
    pub fn new(session: &'a Session, adapter: Address, proposal: Address) -> Self {
        Self {
            session,
            adapter,
            proposal,
        }
    }

    /// Split just enough `underlying` to hold `amount_needed` of `conditional`.
    ///
    /// # Errors
    ///
    /// Returns [`LiquidityError::InsufficientUnderlying`] when the collateral
    /// balance cannot cover the split, or any chain error from the approval or
    /// split transaction.
    pub async fn split_for_shortfall(
        &self,
        conditional: Address,
        underlying: Address,
        amount_needed: U256,
    ) -> Result<SplitOutcome> {
        let verifier = BalanceVerifier::new(self.session);
        let (conditional_balance, underlying_balance) =
            tokio::try_join!(verifier.have(conditional), verifier.have(underlying))?;

        let operation = SplitOperation::plan(
            conditional,
            underlying,
            amount_needed,
            conditional_balance.raw(),
        );
        if operation.is_noop() {
            return Ok(SplitOutcome {
                operation,
                residual: U256::ZERO,
                transactions: Vec::new(),
            });
        }

        if underlying_balance.raw() < operation.amount_to_split {
            let meta = self.session.token(underlying).await?;
            let err = LiquidityError::InsufficientUnderlying {
                token: meta.label(),
                have: meta.display_amount(underlying_balance.raw()),
                need: meta.display_amount(operation.amount_to_split),
            };
            warn!(error = %err, "Cannot split collateral");
            return Err(err.into());
        }

        let mut transactions = Vec::new();
        if let Some(tx) = verifier
            .ensure_allowance(underlying, self.adapter, operation.amount_to_split)
            .await?
        {
            transactions.push(tx);
        }

        self.session.invalidate_balances();
        let tx_hash = self
            .session
            .chain()
            .split_position(
                self.adapter,
                self.proposal,
                underlying,
                operation.amount_to_split,
            )
            .await?;
        info!(
            conditional = %conditional,
            underlying = %underlying,
            amount = %operation.amount_to_split,
            tx_hash = %tx_hash,
            "Split confirmed"
        );
        transactions.push(TxRecord::new(TxStep::Split, tx_hash));

        let after = verifier.have(conditional).await?;
        let residual = shortfall(amount_needed, after.raw());
        if !residual.is_zero() {
            warn!(
                conditional = %conditional,
                residual = %residual,
                "Split left a residual shortfall"
            );
        }

        Ok(SplitOutcome {
            operation,
            residual,
            transactions,
        })
    }

    /// Merge `min(yes, no)` of one collateral's outcome pair back into collateral.
    pub async fn merge_matched_pairs(
        &self,
        collateral: Address,
        yes: Address,
        no: Address,
    ) -> Result<MergeOutcome> {
        let verifier = BalanceVerifier::new(self.session);
        let balances = verifier.have_many(&[yes, no]).await?;
        let plan = MergePlan::plan(collateral, yes, no, balances[0].raw(), balances[1].raw());

        if plan.mergeable.is_zero() {
            info!(collateral = %collateral, "Nothing to merge");
            return Ok(MergeOutcome {
                plan,
                merged: false,
                transactions: Vec::new(),
            });
        }

        let mut transactions = Vec::new();
        for token in [yes, no] {
            if let Some(tx) = verifier
                .ensure_allowance(token, self.adapter, plan.mergeable)
                .await?
            {
                transactions.push(tx);
            }
        }

        self.session.invalidate_balances();
        let tx_hash = self
            .session
            .chain()
            .merge_positions(self.adapter, self.proposal, collateral, plan.mergeable)
            .await?;
        info!(
            collateral = %collateral,
            amount = %plan.mergeable,
            tx_hash = %tx_hash,
            "Merge confirmed"
        );
        transactions.push(TxRecord::new(TxStep::Merge, tx_hash));

        Ok(MergeOutcome {
            plan,
            merged: true,
            transactions,
        })
    }

    /// Merge company and currency pairs as two independent calls.
    ///
    /// A failure on one collateral does not prevent the other merge.
    pub async fn merge_all(&self, tokens: &ProposalTokens) -> Vec<(Address, Result<MergeOutcome>)> {
        let mut results = Vec::with_capacity(2);
        for (collateral, yes, no) in [
            (tokens.company, tokens.yes_company, tokens.no_company),
            (tokens.currency, tokens.yes_currency, tokens.no_currency),
        ] {
            let result = self.merge_matched_pairs(collateral, yes, no).await;
            if let Err(e) = &result {
                warn!(collateral = %collateral, error = %e, "Merge failed");
            }
            results.push((collateral, result));
        }
        results
    }
}
