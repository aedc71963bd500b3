//! UK income tax and employee National Insurance (England, Wales and
//! Northern Ireland rates).
//!
//! The personal allowance is withdrawn by £1 for every £2 of income above the
//! taper threshold; the bands then apply to income above the allowance.
//! Class 1 National Insurance uses its own bands on employment income.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::non_negative;
use crate::calculations::{CalculationError, compute_bracket_tax, marginal_rate};
use crate::input::{or_default, require_non_negative, require_non_negative_opt};
use crate::models::{
    BracketTable, CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables,
};

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `amounts.personal_allowance` | 12,570 |
/// | `amounts.allowance_taper_threshold` | 100,000 |
/// | `rates.allowance_taper` | 50% |
/// | `brackets.income_tax` | bands on income after the allowance |
/// | `brackets.national_insurance` | employee class 1 bands |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxConfig {
    pub personal_allowance: Decimal,
    pub taper_threshold: Decimal,
    pub taper_rate: Percent,
    pub bands: BracketTable,
    pub national_insurance: BracketTable,
}

impl IncomeTaxConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            personal_allowance: tables.amount("personal_allowance")?,
            taper_threshold: tables.amount("allowance_taper_threshold")?,
            taper_rate: tables.rate("allowance_taper")?,
            bands: tables.bracket_table("income_tax")?.clone(),
            national_insurance: tables.bracket_table("national_insurance")?.clone(),
        })
    }

    /// Personal allowance left at `income`.
    pub fn personal_allowance_for(
        &self,
        income: Decimal,
    ) -> Decimal {
        let reduction = self.taper_rate.of(non_negative(income - self.taper_threshold));
        non_negative(self.personal_allowance - reduction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    /// Total taxable income before the personal allowance.
    pub gross_income: Decimal,
    /// Earnings subject to National Insurance. Empty means all of the gross income.
    pub employment_income: Option<Decimal>,
}

impl IncomeTaxInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.gross_income, "gross_income")?;
        require_non_negative_opt(self.employment_income, "employment_income")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxAssessment {
    pub personal_allowance: Decimal,
    pub taxable_income: Decimal,
    pub marginal_rate: Percent,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct UkIncomeTax {
    config: IncomeTaxConfig,
}

impl UkIncomeTax {
    pub fn new(config: IncomeTaxConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        input: &IncomeTaxInput,
    ) -> Result<IncomeTaxAssessment, CalculationError> {
        input.validate()?;

        let income = input.gross_income;
        let personal_allowance = self.config.personal_allowance_for(income);
        let taxable_income = non_negative(income - personal_allowance);
        let income_tax = compute_bracket_tax(taxable_income, self.config.bands.brackets());

        let earnings = or_default(input.employment_income, "employment_income", income);
        let national_insurance =
            compute_bracket_tax(earnings, self.config.national_insurance.brackets());
        debug!(%personal_allowance, %taxable_income, %income_tax, %national_insurance, "UK income tax");

        Ok(IncomeTaxAssessment {
            personal_allowance,
            taxable_income,
            marginal_rate: marginal_rate(taxable_income, self.config.bands.brackets()),
            result: CalculationResult::new(
                income,
                taxable_income,
                vec![
                    TaxComponent::new(TaxComponentKind::IncomeTax, income_tax),
                    TaxComponent::new(TaxComponentKind::SocialContributions, national_insurance),
                ],
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TaxBracket;

    fn calculator() -> UkIncomeTax {
        let bracket = |lower, upper, rate| TaxBracket::new(lower, upper, Percent::new(rate));
        UkIncomeTax::new(IncomeTaxConfig {
            personal_allowance: dec!(12570),
            taper_threshold: dec!(100000),
            taper_rate: Percent::new(dec!(50)),
            bands: BracketTable::new(vec![
                bracket(dec!(0), Some(dec!(37700)), dec!(20)),
                bracket(dec!(37700), Some(dec!(125140)), dec!(40)),
                bracket(dec!(125140), None, dec!(45)),
            ])
            .unwrap(),
            national_insurance: BracketTable::new(vec![
                bracket(dec!(0), Some(dec!(12570)), dec!(0)),
                bracket(dec!(12570), Some(dec!(50270)), dec!(8)),
                bracket(dec!(50270), None, dec!(2)),
            ])
            .unwrap(),
        })
    }

    fn assess(income: Decimal) -> IncomeTaxAssessment {
        calculator()
            .calculate(&IncomeTaxInput {
                gross_income: income,
                employment_income: None,
            })
            .unwrap()
    }

    #[test]
    fn higher_rate_taxpayer_on_60000() {
        let assessment = assess(dec!(60000));

        assert_eq!(assessment.personal_allowance, dec!(12570));
        assert_eq!(
            assessment.result.component(TaxComponentKind::IncomeTax),
            dec!(11432)
        );
        assert_eq!(
            assessment.result.component(TaxComponentKind::SocialContributions),
            dec!(3210.60)
        );
        assert_eq!(assessment.marginal_rate, Percent::new(dec!(40)));
    }

    #[test]
    fn allowance_tapers_above_100000() {
        let assessment = assess(dec!(110000));

        assert_eq!(assessment.personal_allowance, dec!(7570));
        assert_eq!(
            assessment.result.component(TaxComponentKind::IncomeTax),
            dec!(33432)
        );
    }

    #[test]
    fn allowance_gone_at_125140() {
        assert_eq!(assess(dec!(125140)).personal_allowance, dec!(0));
        assert_eq!(assess(dec!(200000)).personal_allowance, dec!(0));
    }

    #[test]
    fn additional_rate_above_125140() {
        let assessment = assess(dec!(150000));

        assert_eq!(
            assessment.result.component(TaxComponentKind::IncomeTax),
            dec!(53703)
        );
        assert_eq!(assessment.marginal_rate, Percent::new(dec!(45)));
    }

    #[test]
    fn income_below_allowance_pays_nothing() {
        let assessment = assess(dec!(12000));

        assert_eq!(assessment.result.total_tax, dec!(0));
    }

    #[test]
    fn national_insurance_only_on_employment_income() {
        let assessment = calculator()
            .calculate(&IncomeTaxInput {
                gross_income: dec!(60000),
                employment_income: Some(dec!(0)),
            })
            .unwrap();

        assert_eq!(
            assessment.result.component(TaxComponentKind::SocialContributions),
            dec!(0)
        );
    }
}
