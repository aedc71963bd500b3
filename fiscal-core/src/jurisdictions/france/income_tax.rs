//! French income tax (impôt sur le revenu).
//!
//! Income is divided by the household's parts (quotient familial), taxed with
//! the progressive schedule, and multiplied back by the parts. The saving the
//! extra half-parts bring over the base parts (1 for a single filer, 2 for a
//! couple) is capped per half-part (plafonnement du quotient familial).
//!
//! | Household member | Parts |
//! |------------------|-------|
//! | single filer | 1 |
//! | couple (married or PACS) | 2 |
//! | first and second child | 0.5 each |
//! | third child onwards | 1 each |
//! | single parent raising children alone | +0.5 |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::{BracketTable, Percent, TaxBracket};
//! use fiscal_core::jurisdictions::france::{
//!     FrenchIncomeTax, Household, IncomeTaxConfig, IncomeTaxInput,
//! };
//!
//! let schedule = BracketTable::new(vec![
//!     TaxBracket::new(dec!(0), Some(dec!(11294)), Percent::new(dec!(0))),
//!     TaxBracket::new(dec!(11294), Some(dec!(28797)), Percent::new(dec!(11))),
//!     TaxBracket::new(dec!(28797), Some(dec!(80956)), Percent::new(dec!(30))),
//!     TaxBracket::new(dec!(80956), Some(dec!(174137)), Percent::new(dec!(41))),
//!     TaxBracket::new(dec!(174137), None, Percent::new(dec!(45))),
//! ])
//! .unwrap();
//! let calculator = FrenchIncomeTax::new(IncomeTaxConfig {
//!     schedule,
//!     family_quotient_cap: dec!(1759),
//! });
//!
//! let assessment = calculator
//!     .calculate(&IncomeTaxInput {
//!         net_taxable_income: dec!(30000),
//!         household: Household::single(),
//!     })
//!     .unwrap();
//! assert_eq!(assessment.result.total_tax, dec!(2286.23));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::max;
use crate::calculations::{CalculationError, compute_bracket_tax, marginal_rate};
use crate::input::require_non_negative;
use crate::models::{
    BracketTable, CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables,
};

/// Who the tax household is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    /// Married or in a civil partnership, taxed jointly.
    pub couple: bool,
    /// Dependent children.
    pub children: u32,
    /// Parent raising the children alone (parent isolé).
    #[serde(default)]
    pub single_parent: bool,
}

impl Household {
    pub fn single() -> Self {
        Self {
            couple: false,
            children: 0,
            single_parent: false,
        }
    }

    pub fn couple(children: u32) -> Self {
        Self {
            couple: true,
            children,
            single_parent: false,
        }
    }

    /// Parts without children.
    pub fn base_parts(&self) -> Decimal {
        if self.couple { Decimal::TWO } else { Decimal::ONE }
    }

    /// Total parts of the household.
    pub fn parts(&self) -> Decimal {
        let half = Decimal::new(5, 1);
        let first_two = Decimal::from(self.children.min(2)) * half;
        let further = Decimal::from(self.children.saturating_sub(2));
        let single_parent_bonus = if self.single_parent && !self.couple && self.children > 0 {
            half
        } else {
            Decimal::ZERO
        };

        self.base_parts() + first_two + further + single_parent_bonus
    }
}

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `brackets.income_tax` | progressive schedule per part |
/// | `amounts.family_quotient_cap` | maximum saving per extra half-part |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxConfig {
    pub schedule: BracketTable,
    pub family_quotient_cap: Decimal,
}

impl IncomeTaxConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            schedule: tables.bracket_table("income_tax")?.clone(),
            family_quotient_cap: tables.amount("family_quotient_cap")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    /// Revenu net imposable of the whole household.
    pub net_taxable_income: Decimal,
    pub household: Household,
}

impl IncomeTaxInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.net_taxable_income, "net_taxable_income")?;
        if self.household.single_parent && self.household.couple {
            return Err(CalculationError::invalid(
                "single_parent",
                "a couple cannot claim the single-parent half-part",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxAssessment {
    pub parts: Decimal,
    /// Income per part.
    pub quotient: Decimal,
    pub marginal_rate: Percent,
    /// Whether the family quotient cap limited the saving.
    pub capped: bool,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct FrenchIncomeTax {
    config: IncomeTaxConfig,
}

impl FrenchIncomeTax {
    pub fn new(config: IncomeTaxConfig) -> Self {
        Self { config }
    }

    /// Taxes the household's income with the family quotient.
    ///
    /// # Arguments
    ///
    /// * `input` - Net taxable income and the household composition
    ///
    /// # Returns
    ///
    /// The tax with the parts, income per part and marginal rate used.
    /// `capped` is set when the per-half-part ceiling limited the saving.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for negative income or a
    /// couple claiming the single-parent half-part.
    pub fn calculate(
        &self,
        input: &IncomeTaxInput,
    ) -> Result<IncomeTaxAssessment, CalculationError> {
        input.validate()?;

        let income = input.net_taxable_income;
        let parts = input.household.parts();
        let base_parts = input.household.base_parts();

        let quotient = income / parts;
        let tax_with_parts = self.tax_for_parts(income, parts);
        let tax_base_parts = self.tax_for_parts(income, base_parts);

        let extra_half_parts = (parts - base_parts) * Decimal::TWO;
        let floor = max(
            tax_base_parts - extra_half_parts * self.config.family_quotient_cap,
            Decimal::ZERO,
        );
        let capped = tax_with_parts < floor;
        let tax = if capped { floor } else { tax_with_parts };
        debug!(%parts, %quotient, %tax_with_parts, %tax_base_parts, capped, "French income tax");

        Ok(IncomeTaxAssessment {
            parts,
            quotient,
            marginal_rate: marginal_rate(quotient, self.config.schedule.brackets()),
            capped,
            result: CalculationResult::new(
                income,
                income,
                vec![TaxComponent::new(TaxComponentKind::IncomeTax, tax)],
            ),
        })
    }

    fn tax_for_parts(
        &self,
        income: Decimal,
        parts: Decimal,
    ) -> Decimal {
        compute_bracket_tax(income / parts, self.config.schedule.brackets()) * parts
    }
}
