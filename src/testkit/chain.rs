//! In-memory chain for exercising the liquidity engine without a node.
//!
//! [`MockChain`] keeps ERC-20 balances and allowances, deployed pools,
//! positions and proposal tokens behind one lock. Value-moving calls enforce
//! allowances and balances the way the deployed contracts do, and every
//! confirmed call is appended to a transaction log.

use std::collections::{BTreeMap, HashMap, HashSet};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::pool::ProposalTokens;
use crate::domain::position::Position;
use crate::domain::transaction::TxStep;
use crate::error::{Error, ExecutionError, Result};
use crate::port::outbound::chain::{
    Chain, ConditionalAdapter, MintParams, MintReceipt, PoolRegistry, PoolState, PositionManager,
    ProposalReader, TokenLedger,
};

/// Tick spacing of every mock pool.
pub const MOCK_TICK_SPACING: i32 = 60;

#[derive(Debug, Clone)]
struct MockPool {
    address: Address,
    sqrt_price_x96: U256,
}

#[derive(Debug, Clone)]
struct MockPosition {
    owner: Address,
    token0: Address,
    token1: Address,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
    reserve0: U256,
    reserve1: U256,
    owed0: U256,
    owed1: U256,
}

impl MockPosition {
    fn view(&self, token_id: U256) -> Position {
        Position {
            token_id,
            token0: self.token0,
            token1: self.token1,
            tick_lower: self.tick_lower,
            tick_upper: self.tick_upper,
            liquidity: self.liquidity,
            tokens_owed0: saturate(self.owed0),
            tokens_owed1: saturate(self.owed1),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    tokens: HashMap<Address, (String, u8)>,
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    pools: HashMap<(Address, Address), MockPool>,
    positions: BTreeMap<U256, MockPosition>,
    proposals: HashMap<Address, ProposalTokens>,
    log: Vec<TxStep>,
    created_pools: Vec<(Address, Address, U256)>,
    last_mint: Option<MintParams>,
    reverts: HashSet<TxStep>,
    reverting_pairs: HashSet<(Address, Address)>,
    split_loss: U256,
    price_after_mint: HashMap<(Address, Address), U256>,
    retained_liquidity: u128,
    next_token_id: u64,
    nonce: u64,
}

impl State {
    fn confirm(&mut self, step: TxStep) -> String {
        self.nonce += 1;
        self.log.push(step);
        format!("0x{:064x}", self.nonce)
    }

    fn check_revert(&mut self, step: TxStep) -> Result<()> {
        if self.reverts.contains(&step) {
            self.nonce += 1;
            return Err(ExecutionError::TransactionRevert {
                step: step.as_str(),
                tx_hash: format!("0x{:064x}", self.nonce),
            }
            .into());
        }
        Ok(())
    }

    fn deploy_pool(&mut self, token0: Address, token1: Address, sqrt_price_x96: U256) -> Address {
        let index = u8::try_from(self.pools.len() + 1).unwrap_or(u8::MAX);
        let address = Address::left_padding_from(&[0xfe, index]);
        self.pools.insert(
            (token0, token1),
            MockPool {
                address,
                sqrt_price_x96,
            },
        );
        address
    }

    fn balance(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    fn credit(&mut self, token: Address, holder: Address, amount: U256) {
        *self.balances.entry((token, holder)).or_default() += amount;
    }

    /// Pull `amount` of `token` from `holder` on behalf of `spender`.
    fn pull(
        &mut self,
        step: TxStep,
        token: Address,
        holder: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        let allowance = self
            .allowances
            .get(&(token, holder, spender))
            .copied()
            .unwrap_or_default();
        if allowance < amount {
            return Err(revert(step, "insufficient allowance"));
        }
        let balance = self.balance(token, holder);
        if balance < amount {
            return Err(revert(step, "transfer amount exceeds balance"));
        }
        self.allowances
            .insert((token, holder, spender), allowance - amount);
        self.balances.insert((token, holder), balance - amount);
        Ok(())
    }

    fn position_mut(&mut self, call: &'static str, token_id: U256) -> Result<&mut MockPosition> {
        self.positions
            .get_mut(&token_id)
            .ok_or_else(|| missing_position(call, token_id))
    }

    fn outcome_pair(
        &self,
        step: TxStep,
        proposal: Address,
        collateral: Address,
    ) -> Result<(Address, Address)> {
        let tokens = self
            .proposals
            .get(&proposal)
            .ok_or_else(|| revert(step, "unknown proposal"))?;
        if collateral == tokens.company {
            Ok((tokens.yes_company, tokens.no_company))
        } else if collateral == tokens.currency {
            Ok((tokens.yes_currency, tokens.no_currency))
        } else {
            Err(revert(step, "collateral is not part of the proposal"))
        }
    }
}

fn revert(step: TxStep, reason: &str) -> Error {
    ExecutionError::SubmissionFailed {
        step: step.as_str(),
        reason: reason.to_string(),
    }
    .into()
}

fn missing_position(call: &'static str, token_id: U256) -> Error {
    ExecutionError::CallFailed {
        call,
        reason: format!("invalid token id {token_id}"),
    }
    .into()
}

fn saturate(value: U256) -> u128 {
    u128::try_from(value).unwrap_or(u128::MAX)
}

/// In-memory [`Chain`] bound to one wallet.
pub struct MockChain {
    owner: Address,
    position_manager: Address,
    state: Mutex<State>,
}

impl MockChain {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            position_manager: Address::with_last_byte(0xee),
            state: Mutex::new(State {
                next_token_id: 1,
                ..State::default()
            }),
        }
    }

    /// Register token metadata.
    pub fn with_token(self, token: Address, symbol: &str, decimals: u8) -> Self {
        self.state
            .lock()
            .tokens
            .insert(token, (symbol.to_string(), decimals));
        self
    }

    /// Register proposal tokens and their metadata (18 decimals).
    pub fn with_proposal(self, proposal: Address, tokens: ProposalTokens) -> Self {
        {
            let mut state = self.state.lock();
            for (token, symbol) in [
                (tokens.company, "C"),
                (tokens.currency, "M"),
                (tokens.yes_company, "YES_C"),
                (tokens.no_company, "NO_C"),
                (tokens.yes_currency, "YES_M"),
                (tokens.no_currency, "NO_M"),
            ] {
                state
                    .tokens
                    .entry(token)
                    .or_insert_with(|| (symbol.to_string(), 18));
            }
            state.proposals.insert(proposal, tokens);
        }
        self
    }

    /// Deploy a pool for an AMM-ordered pair at `sqrt_price_x96`.
    pub fn with_pool(self, token0: Address, token1: Address, sqrt_price_x96: U256) -> Self {
        self.state.lock().deploy_pool(token0, token1, sqrt_price_x96);
        self
    }

    /// Credit `amount` raw units of `token` to the wallet.
    pub fn fund(&self, token: Address, amount: U256) {
        let owner = self.owner;
        self.state.lock().credit(token, owner, amount);
    }

    /// Insert a position directly, owned by `owner`, with reserves equal to its
    /// liquidity on both sides.
    pub fn seed_position(
        &self,
        owner: Address,
        token0: Address,
        token1: Address,
        liquidity: u128,
    ) -> U256 {
        let mut state = self.state.lock();
        let token_id = U256::from(state.next_token_id);
        state.next_token_id += 1;
        state.positions.insert(
            token_id,
            MockPosition {
                owner,
                token0,
                token1,
                tick_lower: -887_220,
                tick_upper: 887_220,
                liquidity,
                reserve0: U256::from(liquidity),
                reserve1: U256::from(liquidity),
                owed0: U256::ZERO,
                owed1: U256::ZERO,
            },
        );
        token_id
    }

    /// Make every transaction of `step` revert.
    pub fn revert_on(&self, step: TxStep) {
        self.state.lock().reverts.insert(step);
    }

    /// Credit each split with `loss` raw units less than it consumed.
    pub fn split_loss(&self, loss: U256) {
        self.state.lock().split_loss = loss;
    }

    /// Move a pool to `sqrt_price_x96` once a mint into it confirms.
    pub fn move_price_after_mint(&self, token0: Address, token1: Address, sqrt_price_x96: U256) {
        self.state
            .lock()
            .price_after_mint
            .insert((token0, token1), sqrt_price_x96);
    }

    /// Leave up to `liquidity` units in a position on every decrease.
    pub fn retain_liquidity_on_decrease(&self, liquidity: u128) {
        self.state.lock().retained_liquidity = liquidity;
    }

    /// Make mints into one AMM-ordered pair revert.
    pub fn revert_mint_for(&self, token0: Address, token1: Address) {
        self.state.lock().reverting_pairs.insert((token0, token1));
    }

    pub fn balance(&self, token: Address) -> U256 {
        self.state.lock().balance(token, self.owner)
    }

    pub fn allowance_to(&self, token: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .allowances
            .get(&(token, self.owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Confirmed transactions in order.
    pub fn transactions(&self) -> Vec<TxStep> {
        self.state.lock().log.clone()
    }

    pub fn last_mint(&self) -> Option<MintParams> {
        self.state.lock().last_mint.clone()
    }

    /// `(token0, token1, sqrt_price_x96)` of pools created through the manager.
    pub fn created_pools(&self) -> Vec<(Address, Address, U256)> {
        self.state.lock().created_pools.clone()
    }

    pub fn pool_sqrt_price(&self, token0: Address, token1: Address) -> Option<U256> {
        self.state
            .lock()
            .pools
            .get(&(token0, token1))
            .map(|pool| pool.sqrt_price_x96)
    }

    pub fn has_position(&self, token_id: U256) -> bool {
        self.state.lock().positions.contains_key(&token_id)
    }
}

#[async_trait]
impl TokenLedger for MockChain {
    async fn symbol(&self, token: Address) -> Result<String> {
        self.state
            .lock()
            .tokens
            .get(&token)
            .map(|(symbol, _)| symbol.clone())
            .ok_or_else(|| {
                ExecutionError::CallFailed {
                    call: "symbol",
                    reason: format!("no token at {token}"),
                }
                .into()
            })
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        self.state
            .lock()
            .tokens
            .get(&token)
            .map(|(_, decimals)| *decimals)
            .ok_or_else(|| {
                ExecutionError::CallFailed {
                    call: "decimals",
                    reason: format!("no token at {token}"),
                }
                .into()
            })
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        Ok(self.state.lock().balance(token, owner))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .state
            .lock()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<String> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::Approve)?;
        state.allowances.insert((token, self.owner, spender), amount);
        Ok(state.confirm(TxStep::Approve))
    }
}

#[async_trait]
impl PoolRegistry for MockChain {
    async fn pool_by_pair(&self, token0: Address, token1: Address) -> Result<Option<Address>> {
        Ok(self
            .state
            .lock()
            .pools
            .get(&(token0, token1))
            .map(|pool| pool.address))
    }

    async fn pool_state(&self, pool: Address) -> Result<PoolState> {
        self.state
            .lock()
            .pools
            .values()
            .find(|candidate| candidate.address == pool)
            .map(|found| PoolState {
                sqrt_price_x96: found.sqrt_price_x96,
                tick: 0,
                tick_spacing: MOCK_TICK_SPACING,
            })
            .ok_or_else(|| {
                ExecutionError::CallFailed {
                    call: "globalState",
                    reason: format!("no pool at {pool}"),
                }
                .into()
            })
    }
}

#[async_trait]
impl PositionManager for MockChain {
    fn position_manager_address(&self) -> Address {
        self.position_manager
    }

    async fn create_and_initialize_pool(
        &self,
        token0: Address,
        token1: Address,
        sqrt_price_x96: U256,
    ) -> Result<String> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::CreatePool)?;
        if state.pools.contains_key(&(token0, token1)) {
            return Err(revert(TxStep::CreatePool, "pool already exists"));
        }
        state.deploy_pool(token0, token1, sqrt_price_x96);
        state.created_pools.push((token0, token1, sqrt_price_x96));
        Ok(state.confirm(TxStep::CreatePool))
    }

    async fn mint(&self, params: &MintParams) -> Result<MintReceipt> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::Mint)?;
        if state
            .reverting_pairs
            .contains(&(params.token0, params.token1))
        {
            return Err(revert(TxStep::Mint, "mint reverted"));
        }
        if !state.pools.contains_key(&(params.token0, params.token1)) {
            return Err(revert(TxStep::Mint, "pool does not exist"));
        }
        let manager = self.position_manager;
        state.pull(
            TxStep::Mint,
            params.token0,
            self.owner,
            manager,
            params.amount0_desired,
        )?;
        state.pull(
            TxStep::Mint,
            params.token1,
            self.owner,
            manager,
            params.amount1_desired,
        )?;

        let token_id = U256::from(state.next_token_id);
        state.next_token_id += 1;
        let liquidity = saturate(params.amount0_desired.min(params.amount1_desired));
        state.positions.insert(
            token_id,
            MockPosition {
                owner: params.recipient,
                token0: params.token0,
                token1: params.token1,
                tick_lower: params.tick_lower,
                tick_upper: params.tick_upper,
                liquidity,
                reserve0: params.amount0_desired,
                reserve1: params.amount1_desired,
                owed0: U256::ZERO,
                owed1: U256::ZERO,
            },
        );
        state.last_mint = Some(params.clone());
        if let Some(moved) = state.price_after_mint.remove(&(params.token0, params.token1)) {
            if let Some(pool) = state.pools.get_mut(&(params.token0, params.token1)) {
                pool.sqrt_price_x96 = moved;
            }
        }
        let tx_hash = state.confirm(TxStep::Mint);
        Ok(MintReceipt { tx_hash, token_id })
    }

    async fn decrease_liquidity(&self, token_id: U256, liquidity: u128) -> Result<String> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::Decrease)?;
        let retained = state.retained_liquidity;
        let position = state.position_mut("decreaseLiquidity", token_id)?;
        if liquidity > position.liquidity || position.liquidity == 0 {
            return Err(revert(TxStep::Decrease, "liquidity exceeds position"));
        }
        let liquidity = liquidity - liquidity.min(retained);
        let total = U256::from(position.liquidity);
        let share0 = position.reserve0 * U256::from(liquidity) / total;
        let share1 = position.reserve1 * U256::from(liquidity) / total;
        position.reserve0 -= share0;
        position.reserve1 -= share1;
        position.owed0 += share0;
        position.owed1 += share1;
        position.liquidity -= liquidity;
        Ok(state.confirm(TxStep::Decrease))
    }

    async fn collect(&self, token_id: U256, recipient: Address) -> Result<String> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::Collect)?;
        let position = state.position_mut("collect", token_id)?;
        let owed = (
            position.token0,
            std::mem::take(&mut position.owed0),
            position.token1,
            std::mem::take(&mut position.owed1),
        );
        state.credit(owed.0, recipient, owed.1);
        state.credit(owed.2, recipient, owed.3);
        Ok(state.confirm(TxStep::Collect))
    }

    async fn burn(&self, token_id: U256) -> Result<String> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::Burn)?;
        let position = state.position_mut("burn", token_id)?;
        if position.liquidity != 0 || !position.owed0.is_zero() || !position.owed1.is_zero() {
            return Err(revert(TxStep::Burn, "position not cleared"));
        }
        state.positions.remove(&token_id);
        Ok(state.confirm(TxStep::Burn))
    }

    async fn position(&self, token_id: U256) -> Result<Position> {
        self.state
            .lock()
            .positions
            .get(&token_id)
            .map(|position| position.view(token_id))
            .ok_or_else(|| missing_position("positions", token_id))
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address> {
        self.state
            .lock()
            .positions
            .get(&token_id)
            .map(|position| position.owner)
            .ok_or_else(|| missing_position("ownerOf", token_id))
    }

    async fn position_count(&self, owner: Address) -> Result<u64> {
        let count = self
            .state
            .lock()
            .positions
            .values()
            .filter(|position| position.owner == owner)
            .count();
        Ok(count as u64)
    }

    async fn token_of_owner_by_index(&self, owner: Address, index: u64) -> Result<U256> {
        let state = self.state.lock();
        let found = usize::try_from(index).ok().and_then(|index| {
            state
                .positions
                .iter()
                .filter(|(_, position)| position.owner == owner)
                .nth(index)
                .map(|(token_id, _)| *token_id)
        });
        found.ok_or_else(|| {
            ExecutionError::CallFailed {
                call: "tokenOfOwnerByIndex",
                reason: format!("index {index} out of bounds"),
            }
            .into()
        })
    }
}

#[async_trait]
impl ConditionalAdapter for MockChain {
    async fn split_position(
        &self,
        adapter: Address,
        proposal: Address,
        collateral: Address,
        amount: U256,
    ) -> Result<String> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::Split)?;
        let (yes, no) = state.outcome_pair(TxStep::Split, proposal, collateral)?;
        state.pull(TxStep::Split, collateral, self.owner, adapter, amount)?;
        let minted = amount.saturating_sub(state.split_loss);
        state.credit(yes, self.owner, minted);
        state.credit(no, self.owner, minted);
        Ok(state.confirm(TxStep::Split))
    }

    async fn merge_positions(
        &self,
        adapter: Address,
        proposal: Address,
        collateral: Address,
        amount: U256,
    ) -> Result<String> {
        let mut state = self.state.lock();
        state.check_revert(TxStep::Merge)?;
        let (yes, no) = state.outcome_pair(TxStep::Merge, proposal, collateral)?;
        state.pull(TxStep::Merge, yes, self.owner, adapter, amount)?;
        state.pull(TxStep::Merge, no, self.owner, adapter, amount)?;
        state.credit(collateral, self.owner, amount);
        Ok(state.confirm(TxStep::Merge))
    }
}

#[async_trait]
impl ProposalReader for MockChain {
    async fn collateral_tokens(&self, proposal: Address) -> Result<(Address, Address)> {
        self.state
            .lock()
            .proposals
            .get(&proposal)
            .map(|tokens| (tokens.company, tokens.currency))
            .ok_or_else(|| {
                ExecutionError::CallFailed {
                    call: "collateralToken1",
                    reason: format!("no proposal at {proposal}"),
                }
                .into()
            })
    }

    async fn wrapped_outcome(&self, proposal: Address, index: u8) -> Result<Address> {
        let state = self.state.lock();
        let tokens = state.proposals.get(&proposal).ok_or_else(|| {
            Error::from(ExecutionError::CallFailed {
                call: "wrappedOutcome",
                reason: format!("no proposal at {proposal}"),
            })
        })?;
        match index {
            0 => Ok(tokens.yes_company),
            1 => Ok(tokens.no_company),
            2 => Ok(tokens.yes_currency),
            3 => Ok(tokens.no_currency),
            _ => Err(ExecutionError::CallFailed {
                call: "wrappedOutcome",
                reason: format!("index {index} out of range"),
            }
            .into()),
        }
    }
}

impl Chain for MockChain {
    fn owner(&self) -> Address {
        self.owner
    }
}
