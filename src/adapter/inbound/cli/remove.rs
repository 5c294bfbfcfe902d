//! Handlers for `remove` and `remove-batch`.

use std::str::FromStr;

use alloy_primitives::U256;
use serde_json::json;

use super::command::{RemoveArgs, RemoveBatchArgs};
use super::connect;
use super::output;
use super::prompt::TerminalConfirm;
use crate::application::batch::{BatchOrchestrator, BatchPolicy, RunMode};
use crate::application::liquidity::{LiquidityManager, RemovalOutcome};
use crate::domain::position::RemovalPercentage;
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::removal;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::confirm::{AutoConfirm, Confirmer};

fn parse_token_id(input: &str) -> Result<U256> {
    U256::from_str(input.trim()).map_err(|e| {
        ConfigError::InvalidValue {
            field: "token_id",
            reason: e.to_string(),
        }
        .into()
    })
}

/// Execute the single-position remove command; any failure is fatal.
pub async fn execute(args: &RemoveArgs, config: &Config) -> Result<()> {
    let token_id = parse_token_id(&args.token_id)?;
    let percentage = RemovalPercentage::try_new(args.percentage)?;
    let session = connect(config).await?;
    let manager = LiquidityManager::new(&session);

    let outcome = if args.collect_only {
        manager.collect_fees(token_id).await?
    } else {
        manager.remove(token_id, percentage).await?
    };
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &RemovalOutcome) {
    if output::is_json() {
        output::json_output(json!({
            "command": "remove",
            "outcome": outcome,
        }));
        return;
    }
    for tx in &outcome.transactions {
        output::transaction(tx.step.as_str(), &tx.tx_hash);
    }
    output::success(&format!(
        "position {} {} (removed {}, remaining {})",
        outcome.token_id, outcome.state, outcome.removed_liquidity, outcome.remaining_liquidity
    ));
}

/// Execute the batch removal command.
pub async fn execute_batch(args: &RemoveBatchArgs, config: &Config) -> Result<()> {
    let items = removal::load(&args.file, args.percentage)?;
    let session = connect(config).await?;
    let store = bootstrap::artifact_store(config);

    let (confirmer, mode): (Box<dyn Confirmer>, RunMode) = if args.auto {
        (Box::new(AutoConfirm), RunMode::Auto)
    } else {
        (Box::new(TerminalConfirm), RunMode::Interactive)
    };
    let policy = BatchPolicy {
        mode,
        stop_on_error: args.stop_on_error,
    };

    let report = BatchOrchestrator::new(&session, confirmer.as_ref())
        .with_store(&store)
        .run_removal(&items, policy)
        .await;

    if output::is_json() {
        output::json_output(json!({
            "command": "remove-batch",
            "report": report,
            "artifact": report.artifact.as_ref().map(|path| path.display().to_string()),
        }));
        return Ok(());
    }

    output::section("Positions");
    for record in &report.positions {
        output::item(record.status, &record.token_id.to_string(), &record.detail);
        for tx in &record.transactions {
            output::transaction(tx.step.as_str(), &tx.tx_hash);
        }
    }
    output::summary(&report.summary);
    if let Some(path) = &report.artifact {
        output::note(&format!("artifact written to {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_accepts_decimal_and_hex() {
        assert_eq!(parse_token_id("42").unwrap(), U256::from(42));
        assert_eq!(parse_token_id("0x2a").unwrap(), U256::from(42));
        assert!(parse_token_id("forty-two").is_err());
    }
}
