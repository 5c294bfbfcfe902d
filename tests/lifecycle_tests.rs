//! Single-pool liquidity lifecycle against the in-memory chain.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use futarchy_liquidity::application::liquidity::{DepositRequest, LiquidityManager, ShortfallCover};
use futarchy_liquidity::application::pricing::PriceSource;
use futarchy_liquidity::application::session::Session;
use futarchy_liquidity::application::split_merge::SplitMergeAccountant;
use futarchy_liquidity::domain::pair::{AmmPair, PricePoint};
use futarchy_liquidity::domain::position::{LifecycleState, RemovalPercentage};
use futarchy_liquidity::domain::price_math::encode_sqrt_price_x96;
use futarchy_liquidity::domain::transaction::{steps, TxStep};
use futarchy_liquidity::error::{Error, ExecutionError, LiquidityError};
use futarchy_liquidity::testkit::chain::MockChain;
use futarchy_liquidity::testkit::domain::{
    adapter_address, addr, proposal_address, proposal_tokens, units,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const OWNER: u8 = 0xaa;

fn chain() -> Arc<MockChain> {
    Arc::new(MockChain::new(addr(OWNER)).with_proposal(proposal_address(), proposal_tokens()))
}

fn deposit(a: Address, b: Address, amount: Decimal, price: Decimal) -> DepositRequest {
    DepositRequest {
        pair: AmmPair::normalize(a, b).unwrap(),
        amount_a: Some(amount),
        amount_b: None,
        price: Some(PricePoint::logical(price).unwrap()),
    }
}

#[tokio::test]
async fn full_removal_decreases_collects_and_burns() {
    let chain = chain();
    let token_id = chain.seed_position(addr(OWNER), addr(1), addr(2), 1_000);
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .remove(token_id, RemovalPercentage::FULL)
        .await
        .unwrap();

    assert_eq!(
        steps(&outcome.transactions),
        vec![TxStep::Decrease, TxStep::Collect, TxStep::Burn]
    );
    assert_eq!(outcome.state, LifecycleState::Burned);
    assert_eq!(outcome.removed_liquidity, 1_000);
    assert!(!chain.has_position(token_id));
    assert_eq!(chain.balance(addr(1)), U256::from(1_000));
    assert_eq!(chain.balance(addr(2)), U256::from(1_000));
}

#[tokio::test]
async fn partial_removal_keeps_position_liquid() {
    let chain = chain();
    let token_id = chain.seed_position(addr(OWNER), addr(1), addr(2), 1_000);
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .remove(token_id, RemovalPercentage::try_new(50).unwrap())
        .await
        .unwrap();

    assert_eq!(
        steps(&outcome.transactions),
        vec![TxStep::Decrease, TxStep::Collect]
    );
    assert_eq!(outcome.remaining_liquidity, 500);
    assert_eq!(outcome.state, LifecycleState::Liquid);
    assert!(chain.has_position(token_id));
}

#[tokio::test]
async fn empty_position_full_removal_skips_decrease() {
    let chain = chain();
    let token_id = chain.seed_position(addr(OWNER), addr(1), addr(2), 0);
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .remove(token_id, RemovalPercentage::FULL)
        .await
        .unwrap();

    assert_eq!(
        steps(&outcome.transactions),
        vec![TxStep::Collect, TxStep::Burn]
    );
}

#[test]
fn out_of_range_percentages_are_rejected() {
    assert!(RemovalPercentage::try_new(0).is_err());
    assert!(RemovalPercentage::try_new(101).is_err());
    assert_eq!(RemovalPercentage::try_new(100).unwrap(), RemovalPercentage::FULL);
}

#[tokio::test]
async fn foreign_position_fails_before_any_transaction() {
    let chain = chain();
    let token_id = chain.seed_position(addr(0x99), addr(1), addr(2), 1_000);
    let session = Session::new(chain.clone());

    let err = LiquidityManager::new(&session)
        .remove(token_id, RemovalPercentage::FULL)
        .await
        .unwrap_err();

    assert!(err.is_ownership_mismatch());
    assert!(chain.transactions().is_empty());
}

#[tokio::test]
async fn collect_only_leaves_liquidity() {
    let chain = chain();
    let token_id = chain.seed_position(addr(OWNER), addr(1), addr(2), 1_000);
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .collect_fees(token_id)
        .await
        .unwrap();

    assert_eq!(steps(&outcome.transactions), vec![TxStep::Collect]);
    assert_eq!(outcome.remaining_liquidity, 1_000);
}

#[tokio::test]
async fn new_pool_is_initialized_from_deposit_ratio() {
    let tokens = proposal_tokens();
    let chain = chain();
    chain.fund(tokens.yes_company, units(10));
    chain.fund(tokens.yes_currency, units(1_050));
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .provide(&deposit(tokens.yes_company, tokens.yes_currency, dec!(10), dec!(105)))
        .await
        .unwrap();

    let created = chain.created_pools();
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0],
        (
            tokens.yes_company,
            tokens.yes_currency,
            encode_sqrt_price_x96(units(10), units(1_050)).unwrap()
        )
    );
    assert!(outcome.created_pool);
    assert_eq!(outcome.target.source, PriceSource::Formula);
    assert_eq!(outcome.state, LifecycleState::Liquid);
    assert!((outcome.observed_price.value() - dec!(105)).abs() < dec!(0.0001));
    assert_eq!(
        steps(&outcome.transactions),
        vec![TxStep::CreatePool, TxStep::Approve, TxStep::Approve, TxStep::Mint]
    );
    assert_eq!(chain.balance(tokens.yes_company), U256::ZERO);
}

#[tokio::test]
async fn inverted_pair_deposits_in_amm_order() {
    let tokens = proposal_tokens();
    let chain = chain();
    chain.fund(tokens.yes_company, units(10));
    chain.fund(tokens.currency, units(500));
    let session = Session::new(chain.clone());

    let request = deposit(tokens.yes_company, tokens.currency, dec!(10), dec!(50));
    assert!(request.pair.is_inverted());
    let outcome = LiquidityManager::new(&session)
        .provide(&request)
        .await
        .unwrap();

    let mint = chain.last_mint().unwrap();
    assert_eq!(mint.token0, tokens.currency);
    assert_eq!(mint.token1, tokens.yes_company);
    assert_eq!(mint.amount0_desired, units(500));
    assert_eq!(mint.amount1_desired, units(10));
    assert_eq!(mint.amount0_min, U256::ZERO);
    assert_eq!(mint.recipient, addr(OWNER));
    assert!((outcome.observed_price.value() - dec!(50)).abs() < dec!(0.0001));
}

#[tokio::test]
async fn existing_pool_price_wins_over_formula() {
    let tokens = proposal_tokens();
    let chain = Arc::new(
        MockChain::new(addr(OWNER))
            .with_proposal(proposal_address(), proposal_tokens())
            .with_pool(
                tokens.yes_company,
                tokens.yes_currency,
                encode_sqrt_price_x96(units(1), units(100)).unwrap(),
            ),
    );
    chain.fund(tokens.yes_company, units(10));
    chain.fund(tokens.yes_currency, units(2_000));
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .provide(&deposit(tokens.yes_company, tokens.yes_currency, dec!(10), dec!(105)))
        .await
        .unwrap();

    assert!(!outcome.created_pool);
    assert!(chain.created_pools().is_empty());
    assert_eq!(outcome.target.source, PriceSource::Existing);
    assert_eq!(outcome.target.price.value(), dec!(100));
    assert_eq!(outcome.amount1, units(1_000));
}

#[tokio::test]
async fn existing_pool_price_overrides_explicit_second_amount() {
    let tokens = proposal_tokens();
    let chain = Arc::new(
        MockChain::new(addr(OWNER))
            .with_proposal(proposal_address(), proposal_tokens())
            .with_pool(
                tokens.yes_company,
                tokens.yes_currency,
                encode_sqrt_price_x96(units(1), units(100)).unwrap(),
            ),
    );
    chain.fund(tokens.yes_company, units(10));
    chain.fund(tokens.yes_currency, units(2_000));
    let session = Session::new(chain.clone());
    let request = DepositRequest {
        pair: AmmPair::normalize(tokens.yes_company, tokens.yes_currency).unwrap(),
        amount_a: Some(dec!(10)),
        amount_b: Some(dec!(1050)),
        price: None,
    };

    let outcome = LiquidityManager::new(&session)
        .provide(&request)
        .await
        .unwrap();

    assert_eq!(outcome.target.source, PriceSource::Existing);
    assert_eq!(outcome.amount0, units(10));
    assert_eq!(outcome.amount1, units(1_000));
    assert_eq!(chain.last_mint().unwrap().amount1_desired, units(1_000));
    assert_eq!(chain.balance(tokens.yes_currency), units(1_000));
}

#[tokio::test]
async fn price_drift_after_mint_is_reported() {
    let tokens = proposal_tokens();
    let chain = Arc::new(
        MockChain::new(addr(OWNER))
            .with_proposal(proposal_address(), proposal_tokens())
            .with_pool(
                tokens.yes_company,
                tokens.yes_currency,
                encode_sqrt_price_x96(units(1), units(100)).unwrap(),
            ),
    );
    chain.move_price_after_mint(
        tokens.yes_company,
        tokens.yes_currency,
        encode_sqrt_price_x96(units(1), units(110)).unwrap(),
    );
    chain.fund(tokens.yes_company, units(10));
    chain.fund(tokens.yes_currency, units(1_000));
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .provide(&deposit(tokens.yes_company, tokens.yes_currency, dec!(10), dec!(100)))
        .await
        .unwrap();

    let drift = outcome.price_drift.expect("drift above tolerance");
    assert!((drift - dec!(0.1)).abs() < dec!(0.0001));
    assert_eq!(outcome.state, LifecycleState::Liquid);
}

#[tokio::test]
async fn aligned_read_back_reports_no_drift() {
    let tokens = proposal_tokens();
    let chain = chain();
    chain.fund(tokens.yes_company, units(10));
    chain.fund(tokens.yes_currency, units(1_050));
    let session = Session::new(chain.clone());

    let outcome = LiquidityManager::new(&session)
        .provide(&deposit(tokens.yes_company, tokens.yes_currency, dec!(10), dec!(105)))
        .await
        .unwrap();

    assert!(outcome.price_drift.is_none());
}

#[tokio::test]
async fn leftover_liquidity_blocks_burn() {
    let chain = chain();
    let token_id = chain.seed_position(addr(OWNER), addr(1), addr(2), 1_000);
    chain.retain_liquidity_on_decrease(1);
    let session = Session::new(chain.clone());

    let err = LiquidityManager::new(&session)
        .remove(token_id, RemovalPercentage::FULL)
        .await
        .unwrap_err();

    match err {
        Error::Liquidity(LiquidityError::ResidualLiquidity { liquidity, .. }) => {
            assert_eq!(liquidity, 1);
        }
        other => panic!("expected ResidualLiquidity, got {other:?}"),
    }
    assert_eq!(chain.transactions(), vec![TxStep::Decrease, TxStep::Collect]);
    assert!(chain.has_position(token_id));
}

#[tokio::test]
async fn reverted_burn_keeps_position() {
    let chain = chain();
    let token_id = chain.seed_position(addr(OWNER), addr(1), addr(2), 1_000);
    chain.revert_on(TxStep::Burn);
    let session = Session::new(chain.clone());

    let err = LiquidityManager::new(&session)
        .remove(token_id, RemovalPercentage::FULL)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Execution(ExecutionError::TransactionRevert { step: "burn", .. })
    ));
    assert_eq!(chain.transactions(), vec![TxStep::Decrease, TxStep::Collect]);
    assert!(chain.has_position(token_id));
    assert_eq!(chain.balance(addr(1)), U256::from(1_000));
}

#[tokio::test]
async fn split_without_enough_collateral_sends_nothing() {
    let tokens = proposal_tokens();
    let chain = chain();
    chain.fund(tokens.company, units(5));
    let session = Session::new(chain.clone());

    let err = SplitMergeAccountant::new(&session, adapter_address(), proposal_address())
        .split_for_shortfall(tokens.yes_company, tokens.company, units(10))
        .await
        .unwrap_err();

    match err {
        Error::Liquidity(LiquidityError::InsufficientUnderlying { have, need, .. }) => {
            assert_eq!(have, dec!(5));
            assert_eq!(need, dec!(10));
        }
        other => panic!("expected InsufficientUnderlying, got {other:?}"),
    }
    assert!(chain.transactions().is_empty());
    assert_eq!(chain.allowance_to(tokens.company, adapter_address()), U256::ZERO);
    assert_eq!(chain.balance(tokens.company), units(5));
}

#[tokio::test]
async fn lossy_split_reports_residual_dust() {
    let tokens = proposal_tokens();
    let chain = chain();
    chain.fund(tokens.company, units(10));
    chain.split_loss(U256::from(3));
    let session = Session::new(chain.clone());

    let outcome = SplitMergeAccountant::new(&session, adapter_address(), proposal_address())
        .split_for_shortfall(tokens.yes_company, tokens.company, units(10))
        .await
        .unwrap();

    assert_eq!(outcome.operation.amount_to_split, units(10));
    assert_eq!(outcome.residual, U256::from(3));
    assert_eq!(
        steps(&outcome.transactions),
        vec![TxStep::Approve, TxStep::Split]
    );
    assert_eq!(chain.allowance_to(tokens.company, adapter_address()), U256::ZERO);
    assert_eq!(chain.balance(tokens.yes_company), units(10) - U256::from(3));
}

#[tokio::test]
async fn shortfall_is_covered_by_splitting_collateral() {
    let tokens = proposal_tokens();
    let chain = chain();
    chain.fund(tokens.company, units(100));
    chain.fund(tokens.currency, units(2_000));
    let session = Session::new(chain.clone());
    let cover = ShortfallCover::new(
        SplitMergeAccountant::new(&session, adapter_address(), proposal_address()),
        tokens,
    );

    let outcome = LiquidityManager::new(&session)
        .with_cover(cover)
        .provide(&deposit(tokens.yes_company, tokens.yes_currency, dec!(10), dec!(105)))
        .await
        .unwrap();

    assert_eq!(
        steps(&outcome.transactions),
        vec![
            TxStep::Approve,
            TxStep::Split,
            TxStep::Approve,
            TxStep::Split,
            TxStep::CreatePool,
            TxStep::Approve,
            TxStep::Approve,
            TxStep::Mint,
        ]
    );
    assert_eq!(chain.balance(tokens.company), units(90));
    assert_eq!(chain.balance(tokens.currency), units(950));
    assert_eq!(chain.balance(tokens.no_company), units(10));
    assert_eq!(chain.balance(tokens.no_currency), units(1_050));
}

#[tokio::test]
async fn insufficient_balance_reports_shortfall_without_transactions() {
    let tokens = proposal_tokens();
    let chain = chain();
    chain.fund(tokens.yes_company, units(5));
    chain.fund(tokens.yes_currency, units(1_050));
    let session = Session::new(chain.clone());

    let err = LiquidityManager::new(&session)
        .provide(&deposit(tokens.yes_company, tokens.yes_currency, dec!(10), dec!(105)))
        .await
        .unwrap_err();

    match err {
        Error::Liquidity(LiquidityError::InsufficientBalance {
            token, shortfall, ..
        }) => {
            assert!(token.contains("YES_C"));
            assert_eq!(shortfall, dec!(5));
        }
        other => panic!("expected InsufficientBalance, got {other:?}"),
    }
    assert!(chain.transactions().is_empty());
}

#[tokio::test]
async fn owned_positions_lists_only_the_wallet() {
    let chain = chain();
    let mine = chain.seed_position(addr(OWNER), addr(1), addr(2), 10);
    chain.seed_position(addr(0x99), addr(1), addr(2), 10);
    let session = Session::new(chain.clone());

    let positions = LiquidityManager::new(&session)
        .owned_positions()
        .await
        .unwrap();

    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].token_id, mine);
}
