//! French real estate capital gains (plus-value immobilière des particuliers).
//!
//! The gain is the sale price net of selling costs, minus the purchase price,
//! acquisition costs and works. When the seller cannot document them:
//!
//! - acquisition costs default to a flat 7.5% of the purchase price
//! - works default to a flat 15% of the purchase price once the property has
//!   been held for more than five years, and to zero before that
//!
//! The gain is then taxed twice, each levy with its own holding-period
//! allowance: 19% income tax (fully exempt after 22 years) and 17.2% social
//! contributions (fully exempt after 30 years). A main residence is exempt
//! outright.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::{CalculationError, resolve_allowance};
use crate::input::{or_zero, require_non_negative, require_non_negative_opt};
use crate::models::{
    Allowance, AllowanceTable, CalculationResult, Holding, Percent, TaxComponent,
    TaxComponentKind, YearTables,
};

const STANDARD: &str = "standard";
const MAIN_RESIDENCE: &str = "main_residence";

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `allowances.real_estate_income_tax` | holding-period schedule for the 19% levy |
/// | `allowances.real_estate_social` | holding-period schedule for social contributions |
/// | `rates.real_estate_income_tax` | 19% |
/// | `rates.social_contributions` | 17.2% |
/// | `rates.acquisition_cost_forfait` | 7.5% |
/// | `rates.works_forfait` | 15% |
/// | `amounts.works_forfait_min_years` | years of holding before the works forfait applies |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGainsConfig {
    pub income_tax_allowances: AllowanceTable,
    pub social_allowances: AllowanceTable,
    pub income_tax_rate: Percent,
    pub social_rate: Percent,
    pub acquisition_cost_forfait: Percent,
    pub works_forfait: Percent,
    pub works_forfait_min_years: u32,
}

impl PropertyGainsConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        let works_forfait_min_years = tables
            .amount("works_forfait_min_years")?
            .to_u32()
            .ok_or_else(|| CalculationError::missing("amounts.works_forfait_min_years"))?;
        Ok(Self {
            income_tax_allowances: tables.allowance_table("real_estate_income_tax")?,
            social_allowances: tables.allowance_table("real_estate_social")?,
            income_tax_rate: tables.rate("real_estate_income_tax")?,
            social_rate: tables.rate("social_contributions")?,
            acquisition_cost_forfait: tables.rate("acquisition_cost_forfait")?,
            works_forfait: tables.rate("works_forfait")?,
            works_forfait_min_years,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGainsInput {
    pub sale_price: Decimal,
    /// Agency fees and other selling costs. Empty means zero.
    pub sale_costs: Option<Decimal>,
    pub purchase_price: Decimal,
    /// Notary fees and registration duties. Empty means the 7.5% forfait.
    pub acquisition_costs: Option<Decimal>,
    /// Construction and improvement works. Empty means the 15% forfait when
    /// eligible, zero otherwise.
    pub works: Option<Decimal>,
    pub holding: Holding,
    pub main_residence: bool,
}

impl PropertyGainsInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.sale_price, "sale_price")?;
        require_non_negative(self.purchase_price, "purchase_price")?;
        require_non_negative_opt(self.sale_costs, "sale_costs")?;
        require_non_negative_opt(self.acquisition_costs, "acquisition_costs")?;
        require_non_negative_opt(self.works, "works")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGainsAssessment {
    pub gain: Decimal,
    pub holding_years: u32,
    pub income_tax_allowance: Percent,
    pub social_allowance: Percent,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct PropertyGains {
    config: PropertyGainsConfig,
}

impl PropertyGains {
    pub fn new(config: PropertyGainsConfig) -> Self {
        Self { config }
    }

    /// # Errors
    ///
    /// [`CalculationError::InvalidInput`] for negative prices or costs;
    /// [`CalculationError::OutOfDomain`] when an allowance table lacks the
    /// property's category.
    pub fn calculate(
        &self,
        input: &PropertyGainsInput,
    ) -> Result<PropertyGainsAssessment, CalculationError> {
        input.validate()?;

        let holding_years = input.holding.completed_years();
        let gain = self.gain(input);
        let category = if input.main_residence { MAIN_RESIDENCE } else { STANDARD };

        let income_tax_allowance =
            resolve_allowance(&self.config.income_tax_allowances, category, holding_years)?;
        let social_allowance =
            resolve_allowance(&self.config.social_allowances, category, holding_years)?;

        if income_tax_allowance.is_full_exemption() {
            debug!(category, "real estate gain fully exempt");
            return Ok(PropertyGainsAssessment {
                gain,
                holding_years,
                income_tax_allowance: Percent::HUNDRED,
                social_allowance: Percent::HUNDRED,
                result: CalculationResult::exempt(gain),
            });
        }
        if gain <= Decimal::ZERO {
            warn!(%gain, "real estate sold at a loss");
            return Ok(PropertyGainsAssessment {
                gain,
                holding_years,
                income_tax_allowance: percent_of(income_tax_allowance),
                social_allowance: percent_of(social_allowance),
                result: CalculationResult::new(gain, Decimal::ZERO, Vec::new()),
            });
        }

        let income_tax_base = income_tax_allowance.apply(gain);
        let social_base = social_allowance.apply(gain);
        let income_tax = self.config.income_tax_rate.of(income_tax_base);
        let social = self.config.social_rate.of(social_base);
        debug!(%gain, holding_years, %income_tax_base, %social_base, "real estate gain");

        Ok(PropertyGainsAssessment {
            gain,
            holding_years,
            income_tax_allowance: percent_of(income_tax_allowance),
            social_allowance: percent_of(social_allowance),
            result: CalculationResult::new(
                gain,
                income_tax_base,
                vec![
                    TaxComponent::new(TaxComponentKind::CapitalGainsTax, income_tax),
                    TaxComponent::new(TaxComponentKind::SocialContributions, social),
                ],
            ),
        })
    }

    fn gain(
        &self,
        input: &PropertyGainsInput,
    ) -> Decimal {
        let net_sale = input.sale_price - or_zero(input.sale_costs, "sale_costs");
        let acquisition_costs = input
            .acquisition_costs
            .unwrap_or_else(|| self.config.acquisition_cost_forfait.of(input.purchase_price));
        let works = match input.works {
            Some(works) => works,
            None if input.holding.exceeds_years(self.config.works_forfait_min_years) => {
                self.config.works_forfait.of(input.purchase_price)
            }
            None => Decimal::ZERO,
        };
        debug!(%acquisition_costs, %works, "acquisition costs and works");

        net_sale - (input.purchase_price + acquisition_costs + works)
    }
}

fn percent_of(allowance: Allowance) -> Percent {
    match allowance {
        Allowance::PercentReduction { percent } => percent,
        Allowance::FullExemption => Percent::HUNDRED,
        Allowance::ExemptAmount { .. } => Percent::ZERO,
    }
}
