//! German property tax, Grundsteuer B under the federal model.
//!
//! `assessed value × Steuermesszahl × Hebesatz`, with the base rate depending
//! on whether the property is residential.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MultiplierTable, MunicipalMultiplier};
use crate::calculations::{CalculationError, MultiplierSpec};
use crate::input::require_non_negative;
use crate::models::{CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyUse {
    Residential,
    NonResidential,
}

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `rates.property_tax_residential` | 0.031% |
/// | `rates.property_tax_non_residential` | 0.034% |
/// | `multipliers.property_tax` | Hebesatz by municipality |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTaxConfig {
    pub residential_rate: Percent,
    pub non_residential_rate: Percent,
    pub multipliers: MultiplierTable,
}

impl PropertyTaxConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            residential_rate: tables.rate("property_tax_residential")?,
            non_residential_rate: tables.rate("property_tax_non_residential")?,
            multipliers: MultiplierTable::from_year_tables(tables, "property_tax"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTaxInput {
    /// Grundsteuerwert from the assessment notice.
    pub assessed_value: Decimal,
    pub property_use: PropertyUse,
    pub multiplier: MunicipalMultiplier,
}

impl PropertyTaxInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.assessed_value, "assessed_value")?;
        self.multiplier.validate()
    }
}

#[derive(Debug, Clone)]
pub struct PropertyTax {
    config: PropertyTaxConfig,
}

impl PropertyTax {
    pub fn new(config: PropertyTaxConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        input: &PropertyTaxInput,
    ) -> Result<CalculationResult, CalculationError> {
        input.validate()?;

        let base_rate = match input.property_use {
            PropertyUse::Residential => self.config.residential_rate,
            PropertyUse::NonResidential => self.config.non_residential_rate,
        };
        let multiplier = self.config.multipliers.resolve(&input.multiplier)?;
        let tax = MultiplierSpec::new(base_rate, multiplier).apply(input.assessed_value);
        debug!(%base_rate, %multiplier, %tax, "property tax");

        Ok(CalculationResult::new(
            input.assessed_value,
            input.assessed_value,
            vec![TaxComponent::new(TaxComponentKind::PropertyTax, tax)],
        ))
    }
}
