//! The six derived pools of a futarchy proposal.
//!
//! C and M are the company and currency collateral tokens; YES_/NO_ are their
//! wrapped conditional outcomes.
//!
//! | # | Pool          | Kind             | Price        |
//! |---|---------------|------------------|--------------|
//! | 1 | YES_C / YES_M | PriceCorrelated  | yes          |
//! | 2 | NO_C / NO_M   | PriceCorrelated  | no           |
//! | 3 | YES_C / M     | ExpectedValue    | spot * p     |
//! | 4 | NO_C / M      | ExpectedValue    | spot * (1-p) |
//! | 5 | YES_M / M     | PredictionMarket | p            |
//! | 6 | NO_M / M      | PredictionMarket | 1 - p        |

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::market::{ConditionalPrices, MarketParameters};
use super::pair::PricePoint;

/// Number of pools derived per proposal.
pub const POOL_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    /// Conditional company against conditional currency of the same outcome.
    PriceCorrelated,
    /// Conditional company against plain currency.
    ExpectedValue,
    /// Conditional currency against plain currency; price is a probability.
    PredictionMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFormula {
    YesPrice,
    NoPrice,
    SpotTimesProbability,
    SpotTimesComplement,
    Probability,
    Complement,
}

impl PriceFormula {
    /// Evaluate the formula in logical (tokenB per tokenA) terms.
    #[must_use]
    pub fn evaluate(&self, params: &MarketParameters, prices: &ConditionalPrices) -> Decimal {
        let p = params.probability();
        match self {
            Self::YesPrice => prices.yes,
            Self::NoPrice => prices.no,
            Self::SpotTimesProbability => params.spot_price() * p,
            Self::SpotTimesComplement => params.spot_price() * (Decimal::ONE - p),
            Self::Probability => p,
            Self::Complement => Decimal::ONE - p,
        }
    }
}

/// Collateral and wrapped outcome token addresses of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTokens {
    pub company: Address,
    pub currency: Address,
    pub yes_company: Address,
    pub no_company: Address,
    pub yes_currency: Address,
    pub no_currency: Address,
}

impl ProposalTokens {
    /// Collateral a conditional token can be split from, if it is one.
    #[must_use]
    pub fn underlying_of(&self, token: Address) -> Option<Address> {
        if token == self.yes_company || token == self.no_company {
            Some(self.company)
        } else if token == self.yes_currency || token == self.no_currency {
            Some(self.currency)
        } else {
            None
        }
    }
}

/// Fixed row of the pool table, before proposal tokens are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolTemplate {
    /// 1-based position in the fixed pool table.
    pub index: usize,
    pub name: &'static str,
    pub kind: PoolKind,
    pub formula: PriceFormula,
}

pub const POOL_TABLE: [PoolTemplate; POOL_COUNT] = [
    PoolTemplate {
        index: 1,
        name: "YES_C/YES_M",
        kind: PoolKind::PriceCorrelated,
        formula: PriceFormula::YesPrice,
    },
    PoolTemplate {
        index: 2,
        name: "NO_C/NO_M",
        kind: PoolKind::PriceCorrelated,
        formula: PriceFormula::NoPrice,
    },
    PoolTemplate {
        index: 3,
        name: "YES_C/M",
        kind: PoolKind::ExpectedValue,
        formula: PriceFormula::SpotTimesProbability,
    },
    PoolTemplate {
        index: 4,
        name: "NO_C/M",
        kind: PoolKind::ExpectedValue,
        formula: PriceFormula::SpotTimesComplement,
    },
    PoolTemplate {
        index: 5,
        name: "YES_M/M",
        kind: PoolKind::PredictionMarket,
        formula: PriceFormula::Probability,
    },
    PoolTemplate {
        index: 6,
        name: "NO_M/M",
        kind: PoolKind::PredictionMarket,
        formula: PriceFormula::Complement,
    },
];

impl PoolTemplate {
    /// Logical `(tokenA, tokenB)` of this row for a proposal.
    fn logical_tokens(&self, tokens: &ProposalTokens) -> (Address, Address) {
        match self.formula {
            PriceFormula::YesPrice => (tokens.yes_company, tokens.yes_currency),
            PriceFormula::NoPrice => (tokens.no_company, tokens.no_currency),
            PriceFormula::SpotTimesProbability => (tokens.yes_company, tokens.currency),
            PriceFormula::SpotTimesComplement => (tokens.no_company, tokens.currency),
            PriceFormula::Probability => (tokens.yes_currency, tokens.currency),
            PriceFormula::Complement => (tokens.no_currency, tokens.currency),
        }
    }
}

/// One derived pool definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSpec {
    /// 1-based position in the fixed pool table.
    pub index: usize,
    pub name: &'static str,
    pub logical_t0: Address,
    pub logical_t1: Address,
    pub kind: PoolKind,
    pub formula: PriceFormula,
}

impl PoolSpec {
    /// Target price for a pool that does not exist yet.
    pub fn formula_price(
        &self,
        params: &MarketParameters,
        prices: &ConditionalPrices,
    ) -> Result<PricePoint, DomainError> {
        PricePoint::logical(self.formula.evaluate(params, prices))
    }
}

/// Derive the six pools in their fixed order.
#[must_use]
pub fn derive_pool_specs(tokens: &ProposalTokens) -> Vec<PoolSpec> {
    POOL_TABLE
        .iter()
        .map(|template| {
            let (logical_t0, logical_t1) = template.logical_tokens(tokens);
            PoolSpec {
                index: template.index,
                name: template.name,
                logical_t0,
                logical_t1,
                kind: template.kind,
                formula: template.formula,
            }
        })
        .collect()
}

/// Price every table row from market parameters alone; used for offline previews.
pub fn preview_prices(
    params: &MarketParameters,
) -> Result<Vec<(PoolTemplate, Decimal)>, DomainError> {
    let prices = params.conditional_prices()?;
    Ok(POOL_TABLE
        .iter()
        .map(|template| (*template, template.formula.evaluate(params, &prices)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tokens() -> ProposalTokens {
        ProposalTokens {
            company: Address::with_last_byte(1),
            currency: Address::with_last_byte(2),
            yes_company: Address::with_last_byte(3),
            no_company: Address::with_last_byte(4),
            yes_currency: Address::with_last_byte(5),
            no_currency: Address::with_last_byte(6),
        }
    }

    #[test]
    fn six_pools_in_table_order() {
        let specs = derive_pool_specs(&tokens());
        assert_eq!(specs.len(), POOL_COUNT);
        let indices: Vec<_> = specs.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(specs[4].kind, PoolKind::PredictionMarket);
        assert_eq!(specs[2].logical_t1, tokens().currency);
        assert_eq!(specs[1].logical_t0, tokens().no_company);
        assert_eq!(specs[0].logical_t1, tokens().yes_currency);
    }

    #[test]
    fn formula_prices_match_table() {
        let params = MarketParameters::try_new(dec!(100), dec!(0.6), dec!(0.10)).unwrap();
        let priced = preview_prices(&params).unwrap();
        let values: Vec<_> = priced.iter().map(|(_, p)| *p).collect();
        assert_eq!(
            values,
            vec![
                dec!(104.0),
                dec!(94.0),
                dec!(60.0),
                dec!(40.0),
                dec!(0.6),
                dec!(0.4)
            ]
        );
    }

    #[test]
    fn certain_outcome_yields_unpriceable_complement_pool() {
        let params = MarketParameters::try_new(dec!(10), dec!(1), dec!(0.1)).unwrap();
        let prices = params.conditional_prices().unwrap();
        let specs = derive_pool_specs(&tokens());
        assert!(specs[5].formula_price(&params, &prices).is_err());
        assert!(specs[4].formula_price(&params, &prices).is_ok());
    }

    #[test]
    fn underlying_resolves_conditional_tokens_only() {
        let t = tokens();
        assert_eq!(t.underlying_of(t.no_company), Some(t.company));
        assert_eq!(t.underlying_of(t.yes_currency), Some(t.currency));
        assert_eq!(t.underlying_of(t.currency), None);
    }
}
