//! Handler for the `prices` command.

use rust_decimal::Decimal;
use serde_json::json;
use tabled::{Table, Tabled};

use super::command::PricesArgs;
use super::output;
use crate::domain::market::MarketParameters;
use crate::domain::pool::preview_prices;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::proposal::ProposalConfig;

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Pool")]
    name: &'static str,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Price")]
    price: String,
}

fn market_parameters(args: &PricesArgs) -> Result<MarketParameters> {
    if let Some(path) = &args.proposal {
        return ProposalConfig::load(path)?.market_parameters();
    }
    let spot = args.spot.ok_or(ConfigError::MissingField { field: "spot" })?;
    let probability = args.probability.ok_or(ConfigError::MissingField {
        field: "probability",
    })?;
    let impact = args
        .impact
        .ok_or(ConfigError::MissingField { field: "impact" })?;
    Ok(MarketParameters::try_new(
        spot,
        probability,
        impact / Decimal::ONE_HUNDRED,
    )?)
}

/// Execute the prices command.
pub fn execute(args: &PricesArgs) -> Result<()> {
    let params = market_parameters(args)?;
    let conditional = params.conditional_prices()?;
    let priced = preview_prices(&params)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "prices",
            "spot_price": params.spot_price(),
            "event_probability": params.probability(),
            "impact": params.impact(),
            "yes_price": conditional.yes,
            "no_price": conditional.no,
            "pools": priced
                .iter()
                .map(|(template, price)| json!({
                    "index": template.index,
                    "name": template.name,
                    "kind": template.kind,
                    "price": price,
                }))
                .collect::<Vec<_>>(),
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Spot", params.spot_price());
    output::field("Probability", params.probability());
    output::field("Impact", params.impact());
    output::field("YES price", output::highlight(conditional.yes.normalize()));
    output::field("NO price", output::highlight(conditional.no.normalize()));

    output::section("Pool prices");
    let rows: Vec<PriceRow> = priced
        .into_iter()
        .map(|(template, price)| PriceRow {
            index: template.index,
            name: template.name,
            kind: format!("{:?}", template.kind),
            price: price.normalize().to_string(),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
