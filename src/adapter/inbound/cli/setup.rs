//! Handler for the `setup` command.

use serde_json::json;

use super::command::SetupArgs;
use super::connect;
use super::output;
use super::prompt::TerminalConfirm;
use crate::application::batch::{BatchOrchestrator, BatchPolicy, RunMode, SetupReport};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::proposal::ProposalConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::confirm::{AutoConfirm, Confirmer};

/// Execute the setup command.
pub async fn execute(args: &SetupArgs, config: &Config) -> Result<()> {
    let plan = ProposalConfig::load(&args.proposal)?.into_plan(config.default_adapter()?)?;
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

    output::note(&format!("setting up pools for {}", plan.proposal));
    let report = BatchOrchestrator::new(&session, confirmer.as_ref())
        .with_store(&store)
        .run_setup(&plan, policy)
        .await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SetupReport) {
    if output::is_json() {
        output::json_output(json!({
            "command": "setup",
            "report": report,
            "artifact": report.artifact.as_ref().map(|path| path.display().to_string()),
        }));
        return;
    }

    output::section("Pools");
    for pool in &report.pools {
        let label = format!("{} {}", pool.index, pool.name);
        output::item(pool.status, &label, &pool.detail);
        if output::verbosity() > 0 {
            if let Some(address) = pool.pool_address {
                output::field("Pool", address);
            }
            if let Some(price) = pool.price {
                output::field("Price", price.normalize());
            }
        }
        for tx in &pool.transactions {
            output::transaction(tx.step.as_str(), &tx.tx_hash);
        }
    }
    output::summary(&report.summary);
    if let Some(path) = &report.artifact {
        output::note(&format!("artifact written to {}", path.display()));
    }
}
