//! German capital gains.
//!
//! Securities fall under the flat withholding tax (Abgeltungsteuer): 25% of the
//! gain after the saver allowance, plus solidarity surcharge. Church members
//! pay church tax on the withholding tax, and the withholding tax is reduced
//! so that `tax = base / (4 + k)` for a church rate `k`.
//!
//! Real estate is a private sale (section 23 EStG): tax-free when
//! owner-occupied or held for more than ten years, tax-free below the
//! exemption limit, otherwise taxed at the seller's marginal rate.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{church_tax_component, validate_church_rate};
use crate::calculations::CalculationError;
use crate::calculations::common::non_negative;
use crate::input::{or_zero, require_non_negative_opt, require_percent_range, require_within_limit};
use crate::models::{
    CalculationResult, Holding, Percent, TaxComponent, TaxComponentKind, YearTables,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GermanAsset {
    Securities,
    RealEstate,
}

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `rates.withholding_tax` | 25% |
/// | `rates.solidarity_surcharge` | 5.5% |
/// | `amounts.saver_allowance_joint` | upper limit of the saver allowance |
/// | `amounts.private_sale_exemption_limit` | Freigrenze for private sales |
/// | `amounts.private_sale_holding_years` | speculation period in years |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsConfig {
    pub withholding_rate: Percent,
    pub solidarity_rate: Percent,
    pub saver_allowance_limit: Decimal,
    pub private_sale_exemption_limit: Decimal,
    pub private_sale_holding_years: u32,
}

impl CapitalGainsConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        let holding_years = tables
            .amount("private_sale_holding_years")?
            .to_u32()
            .ok_or_else(|| CalculationError::missing("amounts.private_sale_holding_years"))?;
        Ok(Self {
            withholding_rate: tables.rate("withholding_tax")?,
            solidarity_rate: tables.rate("solidarity_surcharge")?,
            saver_allowance_limit: tables.amount("saver_allowance_joint")?,
            private_sale_exemption_limit: tables.amount("private_sale_exemption_limit")?,
            private_sale_holding_years: holding_years,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsInput {
    pub asset: GermanAsset,

    /// Sale proceeds minus acquisition cost. May be negative.
    pub gain: Decimal,

    /// Unused saver allowance to offset against a securities gain. Empty means zero.
    pub saver_allowance: Option<Decimal>,

    pub church_tax_rate: Option<Percent>,

    /// Required for real estate.
    pub holding: Option<Holding>,

    /// Real estate used by the seller as their own home.
    pub owner_occupied: bool,

    /// Personal marginal income tax rate, required for taxable real estate.
    pub marginal_rate: Option<Percent>,
}

impl CapitalGainsInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_within_limit(self.gain, "gain")?;
        require_non_negative_opt(self.saver_allowance, "saver_allowance")?;
        validate_church_rate(self.church_tax_rate)?;
        if let Some(rate) = self.marginal_rate {
            require_percent_range(rate, "marginal_rate")?;
        }
        if self.asset == GermanAsset::RealEstate && self.holding.is_none() {
            return Err(CalculationError::invalid(
                "holding",
                "holding period is required for real estate",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GermanCapitalGains {
    config: CapitalGainsConfig,
}

impl GermanCapitalGains {
    pub fn new(config: CapitalGainsConfig) -> Self {
        Self { config }
    }

    /// # Errors
    ///
    /// [`CalculationError::InvalidInput`] for a negative allowance, a rate
    /// outside 0–100%, a saver allowance above the legal limit, or real estate
    /// without a holding period or (when taxable) a marginal rate.
    pub fn calculate(
        &self,
        input: &CapitalGainsInput,
    ) -> Result<CalculationResult, CalculationError> {
        input.validate()?;
        match input.asset {
            GermanAsset::Securities => self.securities(input),
            GermanAsset::RealEstate => self.real_estate(input),
        }
    }

    fn securities(
        &self,
        input: &CapitalGainsInput,
    ) -> Result<CalculationResult, CalculationError> {
        let allowance = or_zero(input.saver_allowance, "saver_allowance");
        if allowance > self.config.saver_allowance_limit {
            return Err(CalculationError::invalid(
                "saver_allowance",
                format!(
                    "cannot exceed {}, got {allowance}",
                    self.config.saver_allowance_limit
                ),
            ));
        }
        if input.gain <= Decimal::ZERO {
            warn!(gain = %input.gain, "securities loss; no withholding tax");
            return Ok(CalculationResult::new(input.gain, Decimal::ZERO, Vec::new()));
        }

        let base = non_negative(input.gain - allowance);
        let rate = self.config.withholding_rate.as_fraction();
        let church = input.church_tax_rate.unwrap_or(Percent::ZERO).as_fraction();
        let withholding = base * rate / (Decimal::ONE + rate * church);
        let soli = self.config.solidarity_rate.of(withholding);
        debug!(%base, %withholding, %soli, "withholding tax on securities");

        let mut components = vec![
            TaxComponent::new(TaxComponentKind::CapitalGainsTax, withholding),
            TaxComponent::new(TaxComponentKind::SolidaritySurcharge, soli),
        ];
        components.extend(church_tax_component(withholding, input.church_tax_rate));

        Ok(CalculationResult::new(input.gain, base, components))
    }

    fn real_estate(
        &self,
        input: &CapitalGainsInput,
    ) -> Result<CalculationResult, CalculationError> {
        let held_long_enough = input
            .holding
            .as_ref()
            .is_some_and(|h| h.exceeds_years(self.config.private_sale_holding_years));
        if input.owner_occupied || held_long_enough {
            debug!(owner_occupied = input.owner_occupied, held_long_enough, "private sale exempt");
            return Ok(CalculationResult::exempt(input.gain));
        }
        if input.gain <= Decimal::ZERO {
            warn!(gain = %input.gain, "private sale at a loss");
            return Ok(CalculationResult::new(input.gain, Decimal::ZERO, Vec::new()));
        }
        if input.gain < self.config.private_sale_exemption_limit {
            debug!(gain = %input.gain, "private sale gain below exemption limit");
            return Ok(CalculationResult::new(input.gain, Decimal::ZERO, Vec::new()));
        }

        let marginal_rate = input.marginal_rate.ok_or_else(|| {
            CalculationError::invalid("marginal_rate", "required for a taxable private sale")
        })?;
        let income_tax = marginal_rate.of(input.gain);
        let soli = self.config.solidarity_rate.of(income_tax);

        let mut components = vec![
            TaxComponent::new(TaxComponentKind::IncomeTax, income_tax),
            TaxComponent::new(TaxComponentKind::SolidaritySurcharge, soli),
        ];
        components.extend(church_tax_component(income_tax, input.church_tax_rate));

        Ok(CalculationResult::new(input.gain, input.gain, components))
    }
}
