//! Authoritative balance and allowance checks.

use alloy_primitives::{Address, U256};
use futures_util::future::try_join_all;
use tracing::{info, warn};

use super::session::Session;
use crate::domain::split::shortfall;
use crate::domain::token::{Balance, TokenMeta};
use crate::domain::transaction::{TxRecord, TxStep};
use crate::error::{LiquidityError, Result};

/// Reads balances straight from chain for value-moving decisions.
pub struct BalanceVerifier<'a> {
    session: &'a Session,
}

impl<'a> BalanceVerifier<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Fresh on-chain balance of the session wallet.
    pub async fn have(&self, token: Address) -> Result<Balance> {
        let raw = self
            .session
            .chain()
            .balance_of(token, self.session.owner())
            .await?;
        self.session.remember_balance(token, raw);
        Ok(Balance::fresh(raw))
    }

    /// Fresh balances of several unrelated tokens, read concurrently.
    pub async fn have_many(&self, tokens: &[Address]) -> Result<Vec<Balance>> {
        try_join_all(tokens.iter().map(|&token| self.have(token))).await
    }

    /// Fail with [`LiquidityError::InsufficientBalance`] unless a fresh read covers `need`.
    pub async fn require(&self, token: Address, need: U256) -> Result<Balance> {
        let balance = self.have(token).await?;
        let missing = shortfall(need, balance.raw());
        if !missing.is_zero() {
            let meta = self.session.token(token).await?;
            let err = insufficient_balance(&meta, balance.raw(), need);
            warn!(error = %err, "Balance check failed");
            return Err(err.into());
        }
        Ok(balance)
    }

    /// Approve `spender` for `amount` unless the current allowance already covers it.
    pub async fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Option<TxRecord>> {
        let chain = self.session.chain();
        let current = chain
            .allowance(token, self.session.owner(), spender)
            .await?;
        if current >= amount {
            return Ok(None);
        }

        self.session.invalidate_balances();
        let tx_hash = chain.approve(token, spender, amount).await?;
        info!(
            token = %token,
            spender = %spender,
            amount = %amount,
            tx_hash = %tx_hash,
            "Approval confirmed"
        );
        Ok(Some(TxRecord::new(TxStep::Approve, tx_hash)))
    }
}

pub(crate) fn insufficient_balance(meta: &TokenMeta, have: U256, need: U256) -> LiquidityError {
    LiquidityError::InsufficientBalance {
        token: meta.label(),
        have: meta.display_amount(have),
        need: meta.display_amount(need),
        shortfall: meta.display_amount(shortfall(need, have)),
    }
}
