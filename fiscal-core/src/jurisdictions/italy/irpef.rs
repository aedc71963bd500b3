//! IRPEF, the Italian personal income tax.
//!
//! National tax from the bracket schedule, plus the regional and municipal
//! surcharges (addizionali) as flat percentages of the same taxable income.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::{CalculationError, compute_bracket_tax};
use crate::input::{percent_or, require_non_negative, require_percent_range};
use crate::models::{
    BracketTable, CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables,
};

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `brackets.irpef` | national schedule |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrpefConfig {
    pub schedule: BracketTable,
}

impl IrpefConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            schedule: tables.bracket_table("irpef")?.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrpefInput {
    pub taxable_income: Decimal,
    /// Addizionale regionale. Empty means zero.
    pub regional_surcharge: Option<Percent>,
    /// Addizionale comunale. Empty means zero.
    pub municipal_surcharge: Option<Percent>,
}

impl IrpefInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.taxable_income, "taxable_income")?;
        if let Some(rate) = self.regional_surcharge {
            require_percent_range(rate, "regional_surcharge")?;
        }
        if let Some(rate) = self.municipal_surcharge {
            require_percent_range(rate, "municipal_surcharge")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Irpef {
    config: IrpefConfig,
}

impl Irpef {
    pub fn new(config: IrpefConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        input: &IrpefInput,
    ) -> Result<CalculationResult, CalculationError> {
        input.validate()?;

        let income = input.taxable_income;
        let national = compute_bracket_tax(income, self.config.schedule.brackets());
        let regional = percent_or(input.regional_surcharge, "regional_surcharge", Percent::ZERO).of(income);
        let municipal = percent_or(input.municipal_surcharge, "municipal_surcharge", Percent::ZERO).of(income);
        debug!(%income, %national, %regional, %municipal, "IRPEF");

        Ok(CalculationResult::new(
            income,
            income,
            vec![
                TaxComponent::new(TaxComponentKind::IncomeTax, national),
                TaxComponent::new(TaxComponentKind::RegionalSurcharge, regional),
                TaxComponent::new(TaxComponentKind::MunicipalSurcharge, municipal),
            ],
        ))
    }
}
