//! Handler for the `positions` command.

use serde_json::json;
use tabled::{Table, Tabled};

use super::connect;
use super::output;
use crate::application::liquidity::LiquidityManager;
use crate::domain::token::canonical;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Token ID")]
    token_id: String,
    #[tabled(rename = "Token0")]
    token0: String,
    #[tabled(rename = "Token1")]
    token1: String,
    #[tabled(rename = "Liquidity")]
    liquidity: u128,
    #[tabled(rename = "Fees owed")]
    owed: String,
}

/// Execute the positions command.
pub async fn execute(config: &Config) -> Result<()> {
    let session = connect(config).await?;
    let positions = LiquidityManager::new(&session).owned_positions().await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "positions",
            "owner": session.owner(),
            "positions": positions,
        }));
        return Ok(());
    }

    output::section(&format!("Positions of {}", session.owner()));
    if positions.is_empty() {
        output::note("no positions");
        return Ok(());
    }
    let rows: Vec<PositionRow> = positions
        .iter()
        .map(|position| PositionRow {
            token_id: position.token_id.to_string(),
            token0: canonical(position.token0),
            token1: canonical(position.token1),
            liquidity: position.liquidity,
            owed: if position.has_owed_tokens() {
                format!("{} / {}", position.tokens_owed0, position.tokens_owed1)
            } else {
                "-".to_string()
            },
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
