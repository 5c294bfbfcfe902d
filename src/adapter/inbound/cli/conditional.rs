//! Handlers for `split` and `merge`.

use serde_json::json;

use super::command::{MergeArgs, SplitArgs};
use super::connect;
use super::output;
use crate::application::proposal::load_proposal_tokens;
use crate::application::split_merge::SplitMergeAccountant;
use crate::domain::amount::to_units;
use crate::domain::token::{canonical, parse_address};
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::settings::Config;

fn resolve_adapter(explicit: Option<&str>, config: &Config) -> Result<alloy_primitives::Address> {
    match explicit {
        Some(value) => Ok(parse_address(value)?),
        None => config.default_adapter()?.ok_or_else(|| {
            Error::from(ConfigError::MissingField {
                field: "contracts.adapter",
            })
        }),
    }
}

/// Execute the split command.
pub async fn execute_split(args: &SplitArgs, config: &Config) -> Result<()> {
    let proposal = parse_address(&args.proposal)?;
    let conditional = parse_address(&args.token)?;
    let adapter = resolve_adapter(args.adapter.as_deref(), config)?;
    let session = connect(config).await?;

    let tokens = load_proposal_tokens(session.chain(), proposal).await?;
    let underlying = tokens.underlying_of(conditional).ok_or_else(|| {
        Error::from(ConfigError::InvalidValue {
            field: "token",
            reason: format!(
                "{} is not a conditional token of proposal {}",
                canonical(conditional),
                canonical(proposal)
            ),
        })
    })?;
    let meta = session.token(conditional).await?;
    let amount = to_units(args.amount, meta.decimals)?;

    let outcome = SplitMergeAccountant::new(&session, adapter, proposal)
        .split_for_shortfall(conditional, underlying, amount)
        .await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "split",
            "outcome": outcome,
        }));
        return Ok(());
    }
    for tx in &outcome.transactions {
        output::transaction(tx.step.as_str(), &tx.tx_hash);
    }
    if outcome.operation.is_noop() {
        output::success(&format!("{} balance already covers {}", meta.label(), args.amount));
    } else {
        output::success(&format!(
            "split {} of {}",
            meta.display_amount(outcome.operation.amount_to_split),
            canonical(underlying)
        ));
    }
    if !outcome.residual.is_zero() {
        output::warning(&format!(
            "residual shortfall of {} {}",
            meta.display_amount(outcome.residual),
            meta.symbol
        ));
    }
    Ok(())
}

/// Execute the merge command; each collateral merges independently.
pub async fn execute_merge(args: &MergeArgs, config: &Config) -> Result<()> {
    let proposal = parse_address(&args.proposal)?;
    let adapter = resolve_adapter(args.adapter.as_deref(), config)?;
    let session = connect(config).await?;

    let tokens = load_proposal_tokens(session.chain(), proposal).await?;
    let results = SplitMergeAccountant::new(&session, adapter, proposal)
        .merge_all(&tokens)
        .await;

    if output::is_json() {
        let merges: Vec<_> = results
            .iter()
            .map(|(collateral, result)| match result {
                Ok(outcome) => json!({ "collateral": collateral, "outcome": outcome }),
                Err(e) => json!({ "collateral": collateral, "error": e.to_string() }),
            })
            .collect();
        output::json_output(json!({ "command": "merge", "merges": merges }));
        return Ok(());
    }

    for (collateral, result) in &results {
        match result {
            Ok(outcome) if outcome.merged => {
                for tx in &outcome.transactions {
                    output::transaction(tx.step.as_str(), &tx.tx_hash);
                }
                output::success(&format!(
                    "merged {} into {}",
                    outcome.plan.mergeable,
                    canonical(*collateral)
                ));
            }
            Ok(_) => output::note(&format!("nothing to merge for {}", canonical(*collateral))),
            Err(e) => output::error(&format!("merge for {} failed: {e}", canonical(*collateral))),
        }
    }
    Ok(())
}
