//! Chain access ports.
//!
//! The liquidity engine talks to the AMM, ERC-20 tokens, the conditional
//! token adapter and the proposal contract only through these traits. Every
//! mutating method returns after its transaction is confirmed, and yields the
//! transaction hash; a reverted transaction is an error.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::domain::position::Position;
use crate::error::Result;

/// Current state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub tick_spacing: i32,
}

/// Parameters of a position mint, in AMM order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParams {
    pub token0: Address,
    pub token1: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: U256,
    pub amount1_desired: U256,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub recipient: Address,
}

/// Confirmed mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tx_hash: String,
    pub token_id: U256,
}

/// ERC-20 reads and approvals.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    async fn symbol(&self, token: Address) -> Result<String>;

    async fn decimals(&self, token: Address) -> Result<u8>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// Approve `spender` for `amount` and wait for confirmation.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<String>;
}

/// Factory lookups and pool state reads.
#[async_trait]
pub trait PoolRegistry: Send + Sync {
    /// Pool for an AMM-ordered pair, if deployed.
    async fn pool_by_pair(&self, token0: Address, token1: Address) -> Result<Option<Address>>;

    async fn pool_state(&self, pool: Address) -> Result<PoolState>;
}

/// Non-fungible position manager operations.
#[async_trait]
pub trait PositionManager: Send + Sync {
    /// Address that must be approved to pull deposit tokens.
    fn position_manager_address(&self) -> Address;

    async fn create_and_initialize_pool(
        &self,
        token0: Address,
        token1: Address,
        sqrt_price_x96: U256,
    ) -> Result<String>;

    async fn mint(&self, params: &MintParams) -> Result<MintReceipt>;

    async fn decrease_liquidity(&self, token_id: U256, liquidity: u128) -> Result<String>;

    /// Collect everything owed to `recipient`.
    async fn collect(&self, token_id: U256, recipient: Address) -> Result<String>;

    async fn burn(&self, token_id: U256) -> Result<String>;

    async fn position(&self, token_id: U256) -> Result<Position>;

    async fn owner_of(&self, token_id: U256) -> Result<Address>;

    async fn position_count(&self, owner: Address) -> Result<u64>;

    async fn token_of_owner_by_index(&self, owner: Address, index: u64) -> Result<U256>;
}

/// Conditional token adapter (split collateral, merge outcomes).
#[async_trait]
pub trait ConditionalAdapter: Send + Sync {
    async fn split_position(
        &self,
        adapter: Address,
        proposal: Address,
        collateral: Address,
        amount: U256,
    ) -> Result<String>;

    async fn merge_positions(
        &self,
        adapter: Address,
        proposal: Address,
        collateral: Address,
        amount: U256,
    ) -> Result<String>;
}

/// Proposal contract reads.
#[async_trait]
pub trait ProposalReader: Send + Sync {
    /// `(company, currency)` collateral tokens.
    async fn collateral_tokens(&self, proposal: Address) -> Result<(Address, Address)>;

    /// Wrapped outcome token by index: 0 YES company, 1 NO company,
    /// 2 YES currency, 3 NO currency.
    async fn wrapped_outcome(&self, proposal: Address, index: u8) -> Result<Address>;
}

/// Everything the engine needs from the chain, bound to one wallet.
pub trait Chain:
    TokenLedger + PoolRegistry + PositionManager + ConditionalAdapter + ProposalReader
{
    /// Wallet address that signs and receives.
    fn owner(&self) -> Address;
}
