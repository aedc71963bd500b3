//! German calculators.
//!
//! | Calculator | Levy |
//! |------------|------|
//! | [`GermanIncomeTax`] | Einkommensteuer, Solidaritätszuschlag, Kirchensteuer |
//! | [`GermanCapitalGains`] | Abgeltungsteuer on securities, private sales of real estate |
//! | [`InheritanceTax`] | Erbschaft- und Schenkungsteuer |
//! | [`TradeTax`] | Gewerbesteuer |
//! | [`PropertyTax`] | Grundsteuer B (federal model) |

mod capital_gains;
mod income_tax;
mod inheritance;
mod property_tax;
mod trade_tax;

pub use capital_gains::{
    CapitalGainsConfig, CapitalGainsInput, GermanAsset, GermanCapitalGains,
};
pub use income_tax::{GermanIncomeTax, IncomeTariff, IncomeTaxConfig, IncomeTaxInput};
pub use inheritance::{
    InheritanceAssessment, InheritanceConfig, InheritanceInput, InheritanceTax, Relationship,
    TaxClass, TransferKind,
};
pub use property_tax::{PropertyTax, PropertyTaxConfig, PropertyTaxInput, PropertyUse};
pub use trade_tax::{LegalForm, TradeTax, TradeTaxAssessment, TradeTaxConfig, TradeTaxInput};

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::{CalculationError, MultiplierSpec};
use crate::input::require_percent_range;
use crate::models::{Percent, TaxComponent, TaxComponentKind, YearTables};

/// A municipal multiplier (Hebesatz), given directly or by municipality name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MunicipalMultiplier {
    Explicit(Percent),
    Municipality(String),
}

impl MunicipalMultiplier {
    pub fn validate(&self) -> Result<(), CalculationError> {
        match self {
            Self::Explicit(multiplier) => MultiplierSpec::new(Percent::ZERO, *multiplier).validate(),
            Self::Municipality(name) if name.trim().is_empty() => Err(CalculationError::invalid(
                "municipality",
                "municipality name is empty",
            )),
            Self::Municipality(_) => Ok(()),
        }
    }
}

/// Multipliers of one levy keyed by lowercase municipality name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub name: String,
    pub by_municipality: BTreeMap<String, Percent>,
}

impl MultiplierTable {
    /// Reads `multipliers.<schedule>`; a year without the table gets an empty one.
    pub fn from_year_tables(
        tables: &YearTables,
        schedule: &str,
    ) -> Self {
        Self {
            name: format!("{} {schedule} multipliers", tables.key()),
            by_municipality: tables.multipliers.get(schedule).cloned().unwrap_or_default(),
        }
    }

    pub fn resolve(
        &self,
        multiplier: &MunicipalMultiplier,
    ) -> Result<Percent, CalculationError> {
        match multiplier {
            MunicipalMultiplier::Explicit(value) => Ok(*value),
            MunicipalMultiplier::Municipality(name) => self
                .by_municipality
                .get(&name.trim().to_lowercase())
                .copied()
                .ok_or_else(|| CalculationError::out_of_domain(&self.name, name.as_str())),
        }
    }
}

/// Solidarity surcharge on an income or withholding tax amount.
///
/// No surcharge while `tax <= exemption`; above it, the lesser of the full
/// rate and the phase-in rate applied to the excess.
pub(crate) fn solidarity_surcharge(
    tax: Decimal,
    rate: Percent,
    exemption: Decimal,
    phase_in_rate: Percent,
) -> Decimal {
    if tax <= exemption {
        return Decimal::ZERO;
    }
    let full = rate.of(tax);
    if exemption.is_zero() {
        return full;
    }
    full.min(phase_in_rate.of(tax - exemption))
}

/// Church tax as a component, when the taxpayer is a member.
pub(crate) fn church_tax_component(
    tax: Decimal,
    church_rate: Option<Percent>,
) -> Option<TaxComponent> {
    church_rate
        .filter(|rate| !rate.is_zero())
        .map(|rate| TaxComponent::new(TaxComponentKind::ChurchTax, rate.of(tax)))
}

pub(crate) fn validate_church_rate(rate: Option<Percent>) -> Result<(), CalculationError> {
    match rate {
        Some(rate) => require_percent_range(rate, "church_tax_rate"),
        None => Ok(()),
    }
}
