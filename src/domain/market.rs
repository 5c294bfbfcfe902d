//! Market parameters and conditional price derivation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Maximum relative drift allowed between `p*yes + (1-p)*no` and spot.
pub const CONSERVATION_TOLERANCE: Decimal = dec!(0.001);

/// Validated inputs for a proposal's price derivation.
///
/// `impact` is a fraction (0.10 for a 10% expected price move on YES).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMarketParameters")]
pub struct MarketParameters {
    spot_price: Decimal,
    probability: Decimal,
    impact: Decimal,
}

#[derive(Deserialize)]
struct RawMarketParameters {
    spot_price: Decimal,
    probability: Decimal,
    impact: Decimal,
}

impl TryFrom<RawMarketParameters> for MarketParameters {
    type Error = DomainError;

    fn try_from(raw: RawMarketParameters) -> Result<Self, Self::Error> {
        Self::try_new(raw.spot_price, raw.probability, raw.impact)
    }
}

/// YES/NO conditional prices of the company token in currency terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalPrices {
    pub yes: Decimal,
    pub no: Decimal,
}

impl MarketParameters {
    /// Validate and build market parameters.
    ///
    /// Rejects a non-positive spot, a probability outside `[0, 1]`, a negative
    /// impact, and any `impact * probability >= 1` (which would make the NO
    /// price zero or negative).
    pub fn try_new(
        spot_price: Decimal,
        probability: Decimal,
        impact: Decimal,
    ) -> Result<Self, DomainError> {
        if spot_price <= Decimal::ZERO {
            return Err(DomainError::NonPositiveSpotPrice { spot: spot_price });
        }
        if probability < Decimal::ZERO || probability > Decimal::ONE {
            return Err(DomainError::ProbabilityOutOfRange { probability });
        }
        if impact < Decimal::ZERO {
            return Err(DomainError::NegativeImpact { impact });
        }
        if impact * probability >= Decimal::ONE {
            return Err(DomainError::DegenerateNoPrice {
                impact,
                probability,
            });
        }
        Ok(Self {
            spot_price,
            probability,
            impact,
        })
    }

    #[must_use]
    pub const fn spot_price(&self) -> Decimal {
        self.spot_price
    }

    #[must_use]
    pub const fn probability(&self) -> Decimal {
        self.probability
    }

    #[must_use]
    pub const fn impact(&self) -> Decimal {
        self.impact
    }

    /// Derive YES/NO prices and verify they average back to spot.
    ///
    /// ```text
    /// yes = spot * (1 + impact * (1 - p))
    /// no  = spot * (1 - impact * p)
    /// ```
    pub fn conditional_prices(&self) -> Result<ConditionalPrices, DomainError> {
        let p = self.probability;
        let yes = self.spot_price * (Decimal::ONE + self.impact * (Decimal::ONE - p));
        let no = self.spot_price * (Decimal::ONE - self.impact * p);
        let prices = ConditionalPrices { yes, no };
        check_conservation(self, &prices)?;
        Ok(prices)
    }
}

/// Verify `p*yes + (1-p)*no == spot` within [`CONSERVATION_TOLERANCE`].
pub fn check_conservation(
    params: &MarketParameters,
    prices: &ConditionalPrices,
) -> Result<(), DomainError> {
    let p = params.probability;
    let expected = p * prices.yes + (Decimal::ONE - p) * prices.no;
    let drift = ((expected - params.spot_price) / params.spot_price).abs();
    if drift > CONSERVATION_TOLERANCE {
        return Err(DomainError::PriceConservation {
            expected,
            spot: params.spot_price,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_parameters_yield_105_and_95() {
        let params = MarketParameters::try_new(dec!(100), dec!(0.5), dec!(0.10)).unwrap();
        let prices = params.conditional_prices().unwrap();
        assert_eq!(prices.yes, dec!(105));
        assert_eq!(prices.no, dec!(95));
        assert_eq!(dec!(0.5) * prices.yes + dec!(0.5) * prices.no, dec!(100));
    }

    #[test]
    fn expected_value_matches_spot_across_parameters() {
        for (spot, p, impact) in [
            (dec!(1), dec!(0.3), dec!(0.25)),
            (dec!(2500.5), dec!(0.9), dec!(1)),
            (dec!(0.0042), dec!(0), dec!(0.5)),
            (dec!(37), dec!(1), dec!(0.99)),
        ] {
            let params = MarketParameters::try_new(spot, p, impact).unwrap();
            let prices = params.conditional_prices().unwrap();
            let expected = p * prices.yes + (Decimal::ONE - p) * prices.no;
            assert!(((expected - spot) / spot).abs() <= CONSERVATION_TOLERANCE);
            assert!(prices.no > Decimal::ZERO);
        }
    }

    #[test]
    fn zero_impact_collapses_to_spot() {
        let params = MarketParameters::try_new(dec!(42), dec!(0.7), Decimal::ZERO).unwrap();
        let prices = params.conditional_prices().unwrap();
        assert_eq!(prices.yes, dec!(42));
        assert_eq!(prices.no, dec!(42));
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(matches!(
            MarketParameters::try_new(Decimal::ZERO, dec!(0.5), dec!(0.1)),
            Err(DomainError::NonPositiveSpotPrice { .. })
        ));
        assert!(matches!(
            MarketParameters::try_new(dec!(1), dec!(-0.1), dec!(0.1)),
            Err(DomainError::ProbabilityOutOfRange { .. })
        ));
        assert!(matches!(
            MarketParameters::try_new(dec!(1), dec!(0.5), dec!(-0.1)),
            Err(DomainError::NegativeImpact { .. })
        ));
    }

    #[test]
    fn rejects_impact_that_zeroes_the_no_price() {
        assert!(matches!(
            MarketParameters::try_new(dec!(1), dec!(0.5), dec!(2)),
            Err(DomainError::DegenerateNoPrice { .. })
        ));
        assert!(MarketParameters::try_new(dec!(1), dec!(0.5), dec!(1.99)).is_ok());
    }

    #[test]
    fn deserialize_validates_like_try_new() {
        let params: MarketParameters =
            serde_json::from_str(r#"{"spot_price":"100","probability":"0.5","impact":"0.1"}"#)
                .unwrap();
        assert_eq!(params.impact(), dec!(0.1));

        let err = serde_json::from_str::<MarketParameters>(
            r#"{"spot_price":"1","probability":"0.5","impact":"2"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be below 1"), "{err}");
    }

    #[test]
    fn conservation_check_flags_drifted_prices() {
        let params = MarketParameters::try_new(dec!(100), dec!(0.5), dec!(0.10)).unwrap();
        let drifted = ConditionalPrices {
            yes: dec!(106),
            no: dec!(95),
        };
        assert!(matches!(
            check_conservation(&params, &drifted),
            Err(DomainError::PriceConservation { .. })
        ));
    }
}
