//! Signing chain client implementing every outbound chain port.
//!
//! Each mutating call is sent, then its receipt is awaited; a receipt with a
//! failed status is reported as [`ExecutionError::TransactionRevert`].

use std::str::FromStr;

use alloy_contract::{CallBuilder, CallDecoder};
use alloy_primitives::aliases::{I24, U160};
use alloy_primitives::ruint::UintTryFrom;
use alloy_primitives::{Address, U256};
use alloy_provider::network::{Ethereum, EthereumWallet, Network, ReceiptResponse};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::contracts::{
    IAlgebraFactory, IAlgebraPool, IERC20, IFutarchyProposal, IFutarchyRouter,
    INonfungiblePositionManager,
};
use super::settings::EvmRuntimeConfig;
use crate::domain::error::DomainError;
use crate::domain::position::Position;
use crate::domain::transaction::TxStep;
use crate::error::{ConfigError, Error, ExecutionError, Result};
use crate::port::outbound::chain::{
    Chain, ConditionalAdapter, MintParams, MintReceipt, PoolRegistry, PoolState, PositionManager,
    ProposalReader, TokenLedger,
};

/// Seconds a submitted position-manager call stays valid.
const DEADLINE_SECS: i64 = 1200;

type Receipt = <Ethereum as Network>::ReceiptResponse;

fn call_failed(call: &'static str) -> impl FnOnce(alloy_contract::Error) -> Error {
    move |e| {
        ExecutionError::CallFailed {
            call,
            reason: e.to_string(),
        }
        .into()
    }
}

fn to_i24(tick: i32) -> Result<I24> {
    I24::try_from(tick).map_err(|_| {
        DomainError::Overflow {
            context: "tick does not fit int24",
        }
        .into()
    })
}

fn to_u160(sqrt_price_x96: U256) -> Result<U160> {
    U160::uint_try_from(sqrt_price_x96).map_err(|_| {
        DomainError::SqrtPriceOutOfRange {
            sqrt_price: sqrt_price_x96.to_string(),
        }
        .into()
    })
}

fn deadline() -> U256 {
    let at = Utc::now().timestamp().saturating_add(DEADLINE_SECS);
    U256::from(u64::try_from(at).unwrap_or_default())
}

/// Send a transaction and wait until it is mined successfully.
async fn submit<P, D>(step: TxStep, call: CallBuilder<P, D>) -> Result<Receipt>
where
    P: Provider,
    D: CallDecoder,
{
    let pending = call
        .send()
        .await
        .map_err(|e| ExecutionError::SubmissionFailed {
            step: step.as_str(),
            reason: e.to_string(),
        })?;
    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| ExecutionError::SubmissionFailed {
            step: step.as_str(),
            reason: format!("failed to get receipt: {e}"),
        })?;

    let tx_hash = format!("{:?}", receipt.transaction_hash());
    if !receipt.status() {
        return Err(ExecutionError::TransactionRevert {
            step: step.as_str(),
            tx_hash,
        }
        .into());
    }
    debug!(step = %step, tx_hash = %tx_hash, "Transaction confirmed");
    Ok(receipt)
}

fn hash_of(receipt: &Receipt) -> String {
    format!("{:?}", receipt.transaction_hash())
}

/// Wallet-bound client for one EVM chain.
pub struct EvmChain {
    provider: DynProvider,
    owner: Address,
    position_manager: Address,
    factory: Address,
}

impl EvmChain {
    /// Connect to the configured endpoint and verify it serves the expected chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key is missing or invalid, the
    /// endpoint is unreachable, or it reports a different chain id.
    pub async fn connect(config: &EvmRuntimeConfig) -> Result<Self> {
        if config.private_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "WALLET_PRIVATE_KEY",
            }
            .into());
        }
        let signer = PrivateKeySigner::from_str(config.private_key.trim()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "WALLET_PRIVATE_KEY",
                reason: e.to_string(),
            }
        })?;
        let owner = signer.address();

        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(config.rpc_url.clone())
            .erased();

        let reported = provider
            .get_chain_id()
            .await
            .map_err(|e| ExecutionError::CallFailed {
                call: "eth_chainId",
                reason: e.to_string(),
            })?;
        if reported != config.chain_id {
            return Err(ConfigError::ChainIdMismatch {
                configured: config.chain_id,
                reported,
            }
            .into());
        }

        info!(
            owner = %owner,
            chain_id = reported,
            position_manager = %config.position_manager,
            "Connected to chain"
        );
        Ok(Self {
            provider,
            owner,
            position_manager: config.position_manager,
            factory: config.factory,
        })
    }

    fn manager(&self) -> INonfungiblePositionManager::INonfungiblePositionManagerInstance<&DynProvider> {
        INonfungiblePositionManager::new(self.position_manager, &self.provider)
    }

    /// Token id minted to this wallet, from the position manager's Transfer log.
    fn minted_token_id(&self, receipt: &Receipt) -> Option<U256> {
        receipt.inner.logs().iter().find_map(|log| {
            if log.inner.address != self.position_manager {
                return None;
            }
            let event = INonfungiblePositionManager::Transfer::decode_log(&log.inner).ok()?;
            (event.data.from == Address::ZERO && event.data.to == self.owner)
                .then_some(event.data.tokenId)
        })
    }
}

#[async_trait]
impl TokenLedger for EvmChain {
    async fn symbol(&self, token: Address) -> Result<String> {
        IERC20::new(token, &self.provider)
            .symbol()
            .call()
            .await
            .map_err(call_failed("symbol"))
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        IERC20::new(token, &self.provider)
            .decimals()
            .call()
            .await
            .map_err(call_failed("decimals"))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(call_failed("balanceOf"))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        IERC20::new(token, &self.provider)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(call_failed("allowance"))
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<String> {
        let erc20 = IERC20::new(token, &self.provider);
        let receipt = submit(TxStep::Approve, erc20.approve(spender, amount)).await?;
        Ok(hash_of(&receipt))
    }
}

#[async_trait]
impl PoolRegistry for EvmChain {
    async fn pool_by_pair(&self, token0: Address, token1: Address) -> Result<Option<Address>> {
        let pool = IAlgebraFactory::new(self.factory, &self.provider)
            .poolByPair(token0, token1)
            .call()
            .await
            .map_err(call_failed("poolByPair"))?;
        Ok((pool != Address::ZERO).then_some(pool))
    }

    async fn pool_state(&self, pool: Address) -> Result<PoolState> {
        let contract = IAlgebraPool::new(pool, &self.provider);
        let global_state = contract.globalState();
        let tick_spacing = contract.tickSpacing();
        let (state, spacing) = tokio::try_join!(
            async { global_state.call().await.map_err(call_failed("globalState")) },
            async { tick_spacing.call().await.map_err(call_failed("tickSpacing")) },
        )?;
        Ok(PoolState {
            sqrt_price_x96: U256::from(state.price),
            tick: state.tick.as_i32(),
            tick_spacing: spacing.as_i32(),
        })
    }
}

#[async_trait]
impl PositionManager for EvmChain {
    fn position_manager_address(&self) -> Address {
        self.position_manager
    }

    async fn create_and_initialize_pool(
        &self,
        token0: Address,
        token1: Address,
        sqrt_price_x96: U256,
    ) -> Result<String> {
        let sqrt_price = to_u160(sqrt_price_x96)?;
        let manager = self.manager();
        let receipt = submit(
            TxStep::CreatePool,
            manager.createAndInitializePoolIfNecessary(token0, token1, sqrt_price),
        )
        .await?;
        Ok(hash_of(&receipt))
    }

    async fn mint(&self, params: &MintParams) -> Result<MintReceipt> {
        let call_params = INonfungiblePositionManager::MintParams {
            token0: params.token0,
            token1: params.token1,
            tickLower: to_i24(params.tick_lower)?,
            tickUpper: to_i24(params.tick_upper)?,
            amount0Desired: params.amount0_desired,
            amount1Desired: params.amount1_desired,
            amount0Min: params.amount0_min,
            amount1Min: params.amount1_min,
            recipient: params.recipient,
            deadline: deadline(),
        };
        let manager = self.manager();
        let receipt = submit(TxStep::Mint, manager.mint(call_params)).await?;
        let tx_hash = hash_of(&receipt);
        let token_id = self
            .minted_token_id(&receipt)
            .ok_or_else(|| ExecutionError::MissingTokenId {
                step: TxStep::Mint.as_str(),
                tx_hash: tx_hash.clone(),
            })?;
        Ok(MintReceipt { tx_hash, token_id })
    }

    async fn decrease_liquidity(&self, token_id: U256, liquidity: u128) -> Result<String> {
        let params = INonfungiblePositionManager::DecreaseLiquidityParams {
            tokenId: token_id,
            liquidity,
            amount0Min: U256::ZERO,
            amount1Min: U256::ZERO,
            deadline: deadline(),
        };
        let manager = self.manager();
        let receipt = submit(TxStep::Decrease, manager.decreaseLiquidity(params)).await?;
        Ok(hash_of(&receipt))
    }

    async fn collect(&self, token_id: U256, recipient: Address) -> Result<String> {
        let params = INonfungiblePositionManager::CollectParams {
            tokenId: token_id,
            recipient,
            amount0Max: u128::MAX,
            amount1Max: u128::MAX,
        };
        let manager = self.manager();
        let receipt = submit(TxStep::Collect, manager.collect(params)).await?;
        Ok(hash_of(&receipt))
    }

    async fn burn(&self, token_id: U256) -> Result<String> {
        let manager = self.manager();
        let receipt = submit(TxStep::Burn, manager.burn(token_id)).await?;
        Ok(hash_of(&receipt))
    }

    async fn position(&self, token_id: U256) -> Result<Position> {
        let position = self
            .manager()
            .positions(token_id)
            .call()
            .await
            .map_err(call_failed("positions"))?;
        Ok(Position {
            token_id,
            token0: position.token0,
            token1: position.token1,
            tick_lower: position.tickLower.as_i32(),
            tick_upper: position.tickUpper.as_i32(),
            liquidity: position.liquidity,
            tokens_owed0: position.tokensOwed0,
            tokens_owed1: position.tokensOwed1,
        })
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address> {
        self.manager()
            .ownerOf(token_id)
            .call()
            .await
            .map_err(call_failed("ownerOf"))
    }

    async fn position_count(&self, owner: Address) -> Result<u64> {
        let count = self
            .manager()
            .balanceOf(owner)
            .call()
            .await
            .map_err(call_failed("balanceOf"))?;
        u64::try_from(count).map_err(|_| {
            DomainError::Overflow {
                context: "position count",
            }
            .into()
        })
    }

    async fn token_of_owner_by_index(&self, owner: Address, index: u64) -> Result<U256> {
        self.manager()
            .tokenOfOwnerByIndex(owner, U256::from(index))
            .call()
            .await
            .map_err(call_failed("tokenOfOwnerByIndex"))
    }
}

#[async_trait]
impl ConditionalAdapter for EvmChain {
    async fn split_position(
        &self,
        adapter: Address,
        proposal: Address,
        collateral: Address,
        amount: U256,
    ) -> Result<String> {
        let router = IFutarchyRouter::new(adapter, &self.provider);
        let receipt = submit(
            TxStep::Split,
            router.splitPosition(proposal, collateral, amount),
        )
        .await?;
        Ok(hash_of(&receipt))
    }

    async fn merge_positions(
        &self,
        adapter: Address,
        proposal: Address,
        collateral: Address,
        amount: U256,
    ) -> Result<String> {
        let router = IFutarchyRouter::new(adapter, &self.provider);
        let receipt = submit(
            TxStep::Merge,
            router.mergePositions(proposal, collateral, amount),
        )
        .await?;
        Ok(hash_of(&receipt))
    }
}

#[async_trait]
impl ProposalReader for EvmChain {
    async fn collateral_tokens(&self, proposal: Address) -> Result<(Address, Address)> {
        let contract = IFutarchyProposal::new(proposal, &self.provider);
        let company = contract.collateralToken1();
        let currency = contract.collateralToken2();
        tokio::try_join!(
            async { company.call().await.map_err(call_failed("collateralToken1")) },
            async { currency.call().await.map_err(call_failed("collateralToken2")) },
        )
    }

    async fn wrapped_outcome(&self, proposal: Address, index: u8) -> Result<Address> {
        let outcome = IFutarchyProposal::new(proposal, &self.provider)
            .wrappedOutcome(U256::from(index))
            .call()
            .await
            .map_err(call_failed("wrappedOutcome"))?;
        Ok(outcome.wrapped1155)
    }
}

impl Chain for EvmChain {
    fn owner(&self) -> Address {
        self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_ticks_fit_int24() {
        assert!(to_i24(-887_220).is_ok());
        assert!(to_i24(887_272).is_ok());
        assert!(to_i24(8_388_608).is_err());
    }

    #[test]
    fn sqrt_price_must_fit_uint160() {
        let one = U256::from(1u8) << 96;
        assert_eq!(to_u160(one).unwrap(), U160::from(1u8) << 96);
        assert!(to_u160(U256::from(1u8) << 160).is_err());
    }

    #[test]
    fn deadline_is_in_the_future() {
        let now = U256::from(u64::try_from(Utc::now().timestamp()).unwrap());
        assert!(deadline() > now);
    }
}
