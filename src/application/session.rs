//! Per-run session context.
//!
//! Owns the chain handle, the token metadata map and the balance cache that
//! every operation shares. Balances recorded here are only ever handed out
//! tagged [`Freshness::Cached`](crate::domain::token::Freshness); the cache is
//! cleared before each mutating call.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::token::{Balance, TokenMeta};
use crate::error::Result;
use crate::port::outbound::chain::Chain;

pub struct Session {
    chain: Arc<dyn Chain>,
    owner: Address,
    tokens: RwLock<HashMap<Address, TokenMeta>>,
    balances: RwLock<HashMap<Address, Balance>>,
}

impl Session {
    pub fn new(chain: Arc<dyn Chain>) -> Self {
        let owner = chain.owner();
        Self {
            chain,
            owner,
            tokens: RwLock::new(HashMap::new()),
            balances: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn chain(&self) -> &dyn Chain {
        self.chain.as_ref()
    }

    /// Wallet acting in this session.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Token metadata, loaded from chain on first reference.
    pub async fn token(&self, address: Address) -> Result<TokenMeta> {
        if let Some(meta) = self.tokens.read().get(&address) {
            return Ok(meta.clone());
        }
        let (symbol, decimals) = tokio::try_join!(
            self.chain.symbol(address),
            self.chain.decimals(address)
        )?;
        let meta = TokenMeta::new(address, symbol, decimals);
        debug!(token = %meta.label(), decimals = decimals, "Loaded token metadata");
        self.tokens.write().insert(address, meta.clone());
        Ok(meta)
    }

    /// Metadata for two tokens, loaded concurrently.
    pub async fn token_pair(&self, a: Address, b: Address) -> Result<(TokenMeta, TokenMeta)> {
        tokio::try_join!(self.token(a), self.token(b))
    }

    /// Remember a balance just read from chain.
    pub fn remember_balance(&self, token: Address, raw: U256) {
        self.balances.write().insert(token, Balance::fresh(raw));
    }

    /// Last remembered balance, always tagged cached.
    #[must_use]
    pub fn cached_balance(&self, token: Address) -> Option<Balance> {
        self.balances.read().get(&token).map(|b| b.into_cached())
    }

    /// Drop every remembered balance; called before each mutating transaction.
    pub fn invalidate_balances(&self) {
        self.balances.write().clear();
    }
}
