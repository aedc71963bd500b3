//! UK capital gains tax.
//!
//! Gains above the annual exempt amount are stacked on top of taxable income:
//! the part that still fits in the basic-rate band pays the lower rate, the
//! rest the higher rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::non_negative;
use crate::calculations::{CalculationError, compute_marginal_bracket_tax};
use crate::input::{or_zero, require_non_negative_opt, require_within_limit};
use crate::models::{BracketTable, CalculationResult, TaxComponent, TaxComponentKind, YearTables};

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `amounts.cgt_annual_exempt` | annual exempt amount |
/// | `brackets.capital_gains` | rates by band of income plus gain |
/// | `brackets.capital_gains_residential` | same, for residential property |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsConfig {
    pub annual_exempt_amount: Decimal,
    pub bands: BracketTable,
    pub residential_bands: BracketTable,
}

impl CapitalGainsConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            annual_exempt_amount: tables.amount("cgt_annual_exempt")?,
            bands: tables.bracket_table("capital_gains")?.clone(),
            residential_bands: tables.bracket_table("capital_gains_residential")?.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsInput {
    pub gain: Decimal,
    /// Income after the personal allowance. Empty means zero.
    pub taxable_income: Option<Decimal>,
    pub residential_property: bool,
}

impl CapitalGainsInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_within_limit(self.gain, "gain")?;
        require_non_negative_opt(self.taxable_income, "taxable_income")
    }
}

#[derive(Debug, Clone)]
pub struct UkCapitalGains {
    config: CapitalGainsConfig,
}

impl UkCapitalGains {
    pub fn new(config: CapitalGainsConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        input: &CapitalGainsInput,
    ) -> Result<CalculationResult, CalculationError> {
        input.validate()?;

        let income = or_zero(input.taxable_income, "taxable_income");
        let taxable_gain = non_negative(input.gain - self.config.annual_exempt_amount);
        let bands = if input.residential_property {
            &self.config.residential_bands
        } else {
            &self.config.bands
        };
        let tax = compute_marginal_bracket_tax(taxable_gain, income, bands.brackets());
        debug!(%income, %taxable_gain, %tax, "UK capital gains tax");

        Ok(CalculationResult::new(
            input.gain,
            taxable_gain,
            vec![TaxComponent::new(TaxComponentKind::CapitalGainsTax, tax)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Percent, TaxBracket};

    fn bands(
        lower: Decimal,
        higher: Decimal,
    ) -> BracketTable {
        BracketTable::new(vec![
            TaxBracket::new(dec!(0), Some(dec!(37700)), Percent::new(lower)),
            TaxBracket::new(dec!(37700), None, Percent::new(higher)),
        ])
        .unwrap()
    }

    fn calculator() -> UkCapitalGains {
        UkCapitalGains::new(CapitalGainsConfig {
            annual_exempt_amount: dec!(3000),
            bands: bands(dec!(18), dec!(24)),
            residential_bands: bands(dec!(18), dec!(24)),
        })
    }

    fn input(
        gain: Decimal,
        income: Option<Decimal>,
    ) -> CapitalGainsInput {
        CapitalGainsInput {
            gain,
            taxable_income: income,
            residential_property: false,
        }
    }

    #[test]
    fn gain_straddling_basic_rate_band() {
        let result = calculator()
            .calculate(&input(dec!(20000), Some(dec!(30000))))
            .unwrap();

        // 7700 × 18% + 9300 × 24%
        assert_eq!(result.taxable_base, dec!(17000));
        assert_eq!(result.total_tax, dec!(3618));
    }

    #[test]
    fn gain_without_other_income() {
        let result = calculator().calculate(&input(dec!(10000), None)).unwrap();

        assert_eq!(result.total_tax, dec!(1260));
    }

    #[test]
    fn higher_rate_taxpayer_pays_higher_rate_only() {
        let result = calculator()
            .calculate(&input(dec!(13000), Some(dec!(80000))))
            .unwrap();

        assert_eq!(result.total_tax, dec!(2400));
    }

    #[test]
    fn gain_within_exempt_amount_pays_nothing() {
        let result = calculator().calculate(&input(dec!(2999), None)).unwrap();

        assert_eq!(result.taxable_base, dec!(0));
        assert_eq!(result.total_tax, dec!(0));
    }

    #[test]
    fn residential_property_uses_its_own_bands() {
        let calculator = UkCapitalGains::new(CapitalGainsConfig {
            residential_bands: bands(dec!(18), dec!(28)),
            bands: bands(dec!(10), dec!(20)),
            annual_exempt_amount: dec!(3000),
        });

        let shares = calculator.calculate(&input(dec!(13000), None)).unwrap();
        let house = calculator
            .calculate(&CapitalGainsInput {
                residential_property: true,
                ..input(dec!(13000), None)
            })
            .unwrap();

        assert_eq!(shares.total_tax, dec!(1000));
        assert_eq!(house.total_tax, dec!(1800));
    }
}
