//! Stamp duty land tax on residential purchases in England and Northern Ireland.
//!
//! Bands are taxed slice by slice like income tax. First-time buyers use a
//! relief schedule as long as the price does not exceed the relief ceiling.
//! Buying an additional dwelling raises every band by the surcharge, except
//! for very cheap properties.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::{CalculationError, compute_bracket_tax};
use crate::input::require_non_negative;
use crate::models::{
    BracketTable, CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables,
};

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `brackets.stamp_duty` | standard residential bands |
/// | `brackets.stamp_duty_first_time_buyer` | relief bands |
/// | `amounts.first_time_buyer_ceiling` | highest price eligible for relief |
/// | `rates.additional_property_surcharge` | added to every band |
/// | `amounts.surcharge_minimum_price` | prices below this pay no surcharge |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampDutyConfig {
    pub bands: BracketTable,
    pub first_time_buyer_bands: BracketTable,
    pub first_time_buyer_ceiling: Decimal,
    pub additional_property_surcharge: Percent,
    pub surcharge_minimum_price: Decimal,
}

impl StampDutyConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            bands: tables.bracket_table("stamp_duty")?.clone(),
            first_time_buyer_bands: tables.bracket_table("stamp_duty_first_time_buyer")?.clone(),
            first_time_buyer_ceiling: tables.amount("first_time_buyer_ceiling")?,
            additional_property_surcharge: tables.rate("additional_property_surcharge")?,
            surcharge_minimum_price: tables.amount("surcharge_minimum_price")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampDutyInput {
    pub price: Decimal,
    pub first_time_buyer: bool,
    /// The buyer will own more than one dwelling after the purchase.
    pub additional_property: bool,
}

impl StampDutyInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.price, "price")?;
        if self.first_time_buyer && self.additional_property {
            return Err(CalculationError::invalid(
                "additional_property",
                "a first-time buyer cannot already own a dwelling",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampDutyAssessment {
    pub first_time_buyer_relief: bool,
    pub surcharge_applied: bool,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct StampDuty {
    config: StampDutyConfig,
}

impl StampDuty {
    pub fn new(config: StampDutyConfig) -> Self {
        Self { config }
    }

    /// First-time buyer relief replaces the standard bands for prices up to
    /// the relief ceiling. The additional-property surcharge raises every
    /// band's rate from the surcharge minimum price upward.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for a negative price or a
    /// first-time buyer who also owns another dwelling.
    pub fn calculate(
        &self,
        input: &StampDutyInput,
    ) -> Result<StampDutyAssessment, CalculationError> {
        input.validate()?;

        let relief =
            input.first_time_buyer && input.price <= self.config.first_time_buyer_ceiling;
        let surcharge =
            input.additional_property && input.price >= self.config.surcharge_minimum_price;

        let bands = match (relief, surcharge) {
            (true, _) => self.config.first_time_buyer_bands.clone(),
            (false, true) => self
                .config
                .bands
                .with_rate_surcharge(self.config.additional_property_surcharge),
            (false, false) => self.config.bands.clone(),
        };
        let duty = compute_bracket_tax(input.price, bands.brackets());
        debug!(price = %input.price, relief, surcharge, %duty, "stamp duty");

        Ok(StampDutyAssessment {
            first_time_buyer_relief: relief,
            surcharge_applied: surcharge,
            result: CalculationResult::new(
                input.price,
                input.price,
                vec![TaxComponent::new(TaxComponentKind::StampDuty, duty)],
            ),
        })
    }
}
