//! Proposal setup files (TOML or JSON).

use std::path::Path;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::batch::SetupPlan;
use crate::domain::market::MarketParameters;
use crate::domain::pool::POOL_COUNT;
use crate::domain::token::parse_address;
use crate::error::{ConfigError, Result};

/// Market parameters and deposit sizing for one proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalConfig {
    pub proposal_address: String,
    pub spot_price: Decimal,
    pub event_probability: Decimal,
    /// Price impact in percent (10 means 10%).
    #[serde(alias = "impact_percent")]
    pub impact: Decimal,
    /// Deposit applied to every pool unless `liquidity_amounts` is given.
    #[serde(default)]
    pub liquidity_amount: Option<Decimal>,
    /// Per-pool deposits in table order.
    #[serde(default)]
    pub liquidity_amounts: Option<Vec<Decimal>>,
    #[serde(default)]
    pub adapter_address: Option<String>,
    #[serde(default)]
    pub force_add_liquidity: Vec<usize>,
    #[serde(default)]
    pub skip_existing_pools: bool,
}

impl ProposalConfig {
    /// Load a proposal file, choosing JSON or TOML by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse_toml(&content)
        }
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::Parse)?)
    }

    pub fn parse_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content).map_err(ConfigError::ParseJson)?)
    }

    /// Market parameters with the impact converted from percent to a fraction.
    pub fn market_parameters(&self) -> Result<MarketParameters> {
        let impact = self.impact / Decimal::ONE_HUNDRED;
        Ok(MarketParameters::try_new(
            self.spot_price,
            self.event_probability,
            impact,
        )?)
    }

    fn amounts(&self) -> Result<[Decimal; POOL_COUNT]> {
        let amounts = match (&self.liquidity_amounts, self.liquidity_amount) {
            (Some(list), _) => <[Decimal; POOL_COUNT]>::try_from(list.as_slice()).map_err(|_| {
                ConfigError::InvalidValue {
                    field: "liquidity_amounts",
                    reason: format!("expected {POOL_COUNT} amounts, got {}", list.len()),
                }
            })?,
            (None, Some(amount)) => [amount; POOL_COUNT],
            (None, None) => {
                return Err(ConfigError::MissingField {
                    field: "liquidity_amount",
                }
                .into())
            }
        };
        if let Some(bad) = amounts.iter().find(|amount| **amount <= Decimal::ZERO) {
            return Err(ConfigError::InvalidValue {
                field: "liquidity_amounts",
                reason: format!("amounts must be positive, got {bad}"),
            }
            .into());
        }
        Ok(amounts)
    }

    /// Validate every field and build the setup plan.
    ///
    /// `default_adapter` comes from the main config and is used when the
    /// proposal file names none.
    pub fn into_plan(self, default_adapter: Option<Address>) -> Result<SetupPlan> {
        let proposal = parse_address(&self.proposal_address)?;
        let adapter = match self.adapter_address.as_deref() {
            Some(value) => parse_address(value)?,
            None => default_adapter.ok_or(ConfigError::MissingField {
                field: "adapter_address",
            })?,
        };
        let params = self.market_parameters()?;
        let amounts = self.amounts()?;
        if let Some(index) = self
            .force_add_liquidity
            .iter()
            .find(|index| !(1..=POOL_COUNT).contains(*index))
        {
            return Err(ConfigError::InvalidValue {
                field: "force_add_liquidity",
                reason: format!("pool index {index} is outside 1..={POOL_COUNT}"),
            }
            .into());
        }

        Ok(SetupPlan {
            proposal,
            adapter,
            params,
            amounts,
            force_add_liquidity: self.force_add_liquidity,
            skip_existing_pools: self.skip_existing_pools,
        })
    }
}
