//! IMU, the Italian municipal property tax.
//!
//! | Step | Value |
//! |------|-------|
//! | Revalued income | rendita catastale × 1.05 |
//! | Taxable value | revalued income × category coefficient |
//! | Tax | taxable value × municipal rate × ownership share × months / 12 |
//!
//! A main residence is exempt unless it is in a luxury category (A/1, A/8,
//! A/9); those pay a reduced rate less a fixed deduction.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::non_negative;
use crate::calculations::{CalculationError, compose_multiplier_tax};
use crate::input::{percent_or, require_non_negative, require_percent_range};
use crate::models::{CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables};

const LUXURY_CATEGORIES: [&str; 3] = ["a1", "a8", "a9"];
const MONTHS_PER_YEAR: u32 = 12;

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `factors.imu_coefficients` | multiplier by cadastral category or category group |
/// | `rates.imu_revaluation` | 5% |
/// | `rates.imu_standard` | default municipal rate |
/// | `rates.imu_main_residence_luxury` | default rate for a luxury main residence |
/// | `amounts.imu_main_residence_deduction` | yearly deduction for a luxury main residence |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImuConfig {
    pub coefficients: BTreeMap<String, Decimal>,
    pub revaluation: Percent,
    pub standard_rate: Percent,
    pub luxury_main_residence_rate: Percent,
    pub main_residence_deduction: Decimal,
}

impl ImuConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            coefficients: tables.factor_table("imu_coefficients")?.clone(),
            revaluation: tables.rate("imu_revaluation")?,
            standard_rate: tables.rate("imu_standard")?,
            luxury_main_residence_rate: tables.rate("imu_main_residence_luxury")?,
            main_residence_deduction: tables.amount("imu_main_residence_deduction")?,
        })
    }

    /// Coefficient for a category such as `A/2`: the exact category first,
    /// then its group letter.
    pub fn coefficient(
        &self,
        category: &str,
    ) -> Result<Decimal, CalculationError> {
        let key = normalize_category(category);
        let group: String = key.chars().take(1).collect();
        self.coefficients
            .get(&key)
            .or_else(|| self.coefficients.get(&group))
            .copied()
            .ok_or_else(|| CalculationError::out_of_domain("imu_coefficients", category))
    }
}

fn normalize_category(category: &str) -> String {
    category
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImuInput {
    /// Rendita catastale.
    pub cadastral_income: Decimal,
    /// Cadastral category, e.g. `A/2` or `C1`.
    pub category: String,
    /// Rate set by the municipality. Empty means the default rate.
    pub municipal_rate: Option<Percent>,
    /// Empty means 100%.
    pub ownership_share: Option<Percent>,
    /// Months of ownership in the year. Empty means 12.
    pub months: Option<u32>,
    pub main_residence: bool,
}

impl ImuInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.cadastral_income, "cadastral_income")?;
        if let Some(rate) = self.municipal_rate {
            require_percent_range(rate, "municipal_rate")?;
        }
        if let Some(share) = self.ownership_share {
            require_percent_range(share, "ownership_share")?;
        }
        if let Some(months) = self.months.filter(|&m| m > MONTHS_PER_YEAR) {
            return Err(CalculationError::invalid(
                "months",
                format!("must be between 0 and 12, got {months}"),
            ));
        }
        Ok(())
    }

    fn is_luxury(&self) -> bool {
        LUXURY_CATEGORIES.contains(&normalize_category(&self.category).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImuAssessment {
    pub coefficient: Decimal,
    /// Base imponibile.
    pub taxable_value: Decimal,
    pub rate: Percent,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct Imu {
    config: ImuConfig,
}

impl Imu {
    pub fn new(config: ImuConfig) -> Self {
        Self { config }
    }

    /// # Errors
    ///
    /// [`CalculationError::InvalidInput`] for a negative income, a rate or share
    /// outside 0–100%, or more than 12 months; [`CalculationError::OutOfDomain`]
    /// for an unknown cadastral category.
    pub fn calculate(
        &self,
        input: &ImuInput,
    ) -> Result<ImuAssessment, CalculationError> {
        input.validate()?;

        let coefficient = self.config.coefficient(&input.category)?;
        let revalued = input.cadastral_income + self.config.revaluation.of(input.cadastral_income);
        let taxable_value = revalued * coefficient;
        let luxury = input.is_luxury();

        if input.main_residence && !luxury {
            debug!(category = %input.category, "main residence exempt from IMU");
            return Ok(ImuAssessment {
                coefficient,
                taxable_value,
                rate: Percent::ZERO,
                result: CalculationResult::exempt(taxable_value),
            });
        }

        let default_rate = if input.main_residence {
            self.config.luxury_main_residence_rate
        } else {
            self.config.standard_rate
        };
        let rate = percent_or(input.municipal_rate, "municipal_rate", default_rate);
        let share = percent_or(input.ownership_share, "ownership_share", Percent::HUNDRED);
        let months = input.months.unwrap_or_else(|| {
            debug!(field = "months", default = MONTHS_PER_YEAR, "field left empty; using default");
            MONTHS_PER_YEAR
        });
        let period = Decimal::from(months) / Decimal::from(MONTHS_PER_YEAR);

        let mut tax = compose_multiplier_tax(taxable_value, rate, share) * period;
        if input.main_residence {
            tax = non_negative(tax - self.config.main_residence_deduction * period);
        }
        debug!(%coefficient, %taxable_value, %rate, %share, months, %tax, "IMU");

        Ok(ImuAssessment {
            coefficient,
            taxable_value,
            rate,
            result: CalculationResult::new(
                taxable_value,
                share.of(taxable_value),
                vec![TaxComponent::new(TaxComponentKind::PropertyTax, tax)],
            ),
        })
    }
}
