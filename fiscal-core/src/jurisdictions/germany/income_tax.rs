//! German income tax (Einkommensteuer) under the section 32a tariff.
//!
//! The tariff is not a plain bracket schedule: the two middle zones are
//! linear-progressive, so the tax there is a quadratic in the income.
//!
//! | Zone | Taxable income `x` | Tax |
//! |------|--------------------|-----|
//! | 1 | up to the basic allowance | 0 |
//! | 2 | up to `zone2_limit` | `(f2·y + 1400)·y`, `y = (x − basic allowance) / 10000` |
//! | 3 | up to `zone3_limit` | `(f3·z + 2397)·z + c3`, `z = (x − zone2_limit) / 10000` |
//! | 4 | up to `zone4_limit` | `42% · x − c4` |
//! | 5 | above | `45% · x − c5` |
//!
//! Taxable income and the resulting tax are both rounded down to whole euros.
//! Married couples assessed jointly pay twice the tax on half their income.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::jurisdictions::germany::IncomeTariff;
//!
//! let tariff = IncomeTariff::for_2025();
//! assert_eq!(tariff.tax(dec!(50000)), dec!(10691));
//! assert_eq!(tariff.tax(dec!(12096)), dec!(0));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{church_tax_component, solidarity_surcharge, validate_church_rate};
use crate::calculations::CalculationError;
use crate::input::require_non_negative;
use crate::models::{CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables};

/// Coefficients of one year's section 32a tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTariff {
    /// Grundfreibetrag.
    pub basic_allowance: Decimal,
    pub zone2_limit: Decimal,
    pub zone2_factor: Decimal,
    pub zone2_entry: Decimal,
    pub zone3_limit: Decimal,
    pub zone3_factor: Decimal,
    pub zone3_entry: Decimal,
    pub zone3_constant: Decimal,
    pub zone4_limit: Decimal,
    pub zone4_rate: Percent,
    pub zone4_constant: Decimal,
    pub zone5_rate: Percent,
    pub zone5_constant: Decimal,
}

impl IncomeTariff {
    /// Tariff for assessment year 2024.
    pub fn for_2024() -> Self {
        Self {
            basic_allowance: Decimal::new(11784, 0),
            zone2_limit: Decimal::new(17005, 0),
            zone2_factor: Decimal::new(95480, 2),
            zone2_entry: Decimal::new(1400, 0),
            zone3_limit: Decimal::new(66760, 0),
            zone3_factor: Decimal::new(18119, 2),
            zone3_entry: Decimal::new(2397, 0),
            zone3_constant: Decimal::new(99121, 2),
            zone4_limit: Decimal::new(277825, 0),
            zone4_rate: Percent::new(Decimal::new(42, 0)),
            zone4_constant: Decimal::new(1063631, 2),
            zone5_rate: Percent::new(Decimal::new(45, 0)),
            zone5_constant: Decimal::new(1897106, 2),
        }
    }

    /// Tariff for assessment year 2025.
    pub fn for_2025() -> Self {
        Self {
            basic_allowance: Decimal::new(12096, 0),
            zone2_limit: Decimal::new(17443, 0),
            zone2_factor: Decimal::new(93230, 2),
            zone2_entry: Decimal::new(1400, 0),
            zone3_limit: Decimal::new(68480, 0),
            zone3_factor: Decimal::new(17664, 2),
            zone3_entry: Decimal::new(2397, 0),
            zone3_constant: Decimal::new(101513, 2),
            zone4_limit: Decimal::new(277825, 0),
            zone4_rate: Percent::new(Decimal::new(42, 0)),
            zone4_constant: Decimal::new(1091192, 2),
            zone5_rate: Percent::new(Decimal::new(45, 0)),
            zone5_constant: Decimal::new(1924667, 2),
        }
    }

    /// Tax on a single taxpayer's taxable income (Grundtabelle).
    pub fn tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        let x = taxable_income.floor();
        let ten_thousand = Decimal::new(10000, 0);

        let tax = if x <= self.basic_allowance {
            Decimal::ZERO
        } else if x <= self.zone2_limit {
            let y = (x - self.basic_allowance) / ten_thousand;
            (self.zone2_factor * y + self.zone2_entry) * y
        } else if x <= self.zone3_limit {
            let z = (x - self.zone2_limit) / ten_thousand;
            (self.zone3_factor * z + self.zone3_entry) * z + self.zone3_constant
        } else if x <= self.zone4_limit {
            self.zone4_rate.of(x) - self.zone4_constant
        } else {
            self.zone5_rate.of(x) - self.zone5_constant
        };

        tax.max(Decimal::ZERO).floor()
    }

    /// Tax under joint assessment (Splittingtarif).
    pub fn split_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        self.tax(taxable_income / Decimal::TWO) * Decimal::TWO
    }
}

/// Tables the income tax calculator reads.
///
/// | Year-table entry | Use |
/// |------------------|-----|
/// | `income_tariff` | section 32a coefficients |
/// | `rates.solidarity_surcharge` | 5.5% |
/// | `rates.solidarity_phase_in` | 11.9% |
/// | `amounts.solidarity_exemption_single` | Freigrenze, single assessment |
/// | `amounts.solidarity_exemption_joint` | Freigrenze, joint assessment |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxConfig {
    pub tariff: IncomeTariff,
    pub solidarity_rate: Percent,
    pub solidarity_phase_in_rate: Percent,
    pub solidarity_exemption_single: Decimal,
    pub solidarity_exemption_joint: Decimal,
}

impl IncomeTaxConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            tariff: tables.income_tariff()?.clone(),
            solidarity_rate: tables.rate("solidarity_surcharge")?,
            solidarity_phase_in_rate: tables.rate("solidarity_phase_in")?,
            solidarity_exemption_single: tables.amount("solidarity_exemption_single")?,
            solidarity_exemption_joint: tables.amount("solidarity_exemption_joint")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    /// Zu versteuerndes Einkommen.
    pub taxable_income: Decimal,

    /// Married couple assessed jointly.
    pub joint_assessment: bool,

    /// 8% or 9% for church members, `None` otherwise.
    pub church_tax_rate: Option<Percent>,
}

impl IncomeTaxInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.taxable_income, "taxable_income")?;
        validate_church_rate(self.church_tax_rate)
    }
}

#[derive(Debug, Clone)]
pub struct GermanIncomeTax {
    config: IncomeTaxConfig,
}

impl GermanIncomeTax {
    pub fn new(config: IncomeTaxConfig) -> Self {
        Self { config }
    }

    /// Income tax plus solidarity surcharge and church tax.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for negative income or a
    /// church tax rate outside 0–100%.
    pub fn calculate(
        &self,
        input: &IncomeTaxInput,
    ) -> Result<CalculationResult, CalculationError> {
        input.validate()?;

        let taxable_income = input.taxable_income.floor();
        let (income_tax, exemption) = if input.joint_assessment {
            (
                self.config.tariff.split_tax(taxable_income),
                self.config.solidarity_exemption_joint,
            )
        } else {
            (
                self.config.tariff.tax(taxable_income),
                self.config.solidarity_exemption_single,
            )
        };

        let soli = solidarity_surcharge(
            income_tax,
            self.config.solidarity_rate,
            exemption,
            self.config.solidarity_phase_in_rate,
        );
        debug!(%taxable_income, %income_tax, %soli, joint = input.joint_assessment, "German income tax");

        let mut components = vec![
            TaxComponent::new(TaxComponentKind::IncomeTax, income_tax),
            TaxComponent::new(TaxComponentKind::SolidaritySurcharge, soli),
        ];
        components.extend(church_tax_component(income_tax, input.church_tax_rate));

        Ok(CalculationResult::new(
            input.taxable_income,
            taxable_income,
            components,
        ))
    }
}
