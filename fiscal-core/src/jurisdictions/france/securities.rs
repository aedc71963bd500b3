//! French capital gains on securities.
//!
//! By default gains bear the flat tax (prélèvement forfaitaire unique):
//! 12.8% income tax plus 17.2% social contributions. A taxpayer may opt for
//! the progressive scale instead, where shares bought before 2018 earn a
//! holding-period allowance on the income-tax base (50% after two years,
//! 65% after eight). Social contributions always apply to the full gain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::{CalculationError, resolve_allowance};
use crate::input::{require_percent_range, require_within_limit};
use crate::models::{
    AllowanceTable, CalculationResult, Holding, Percent, TaxComponent, TaxComponentKind,
    YearTables,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecuritiesRegime {
    #[default]
    FlatTax,
    Progressive,
}

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `rates.flat_tax_income` | 12.8% |
/// | `rates.social_contributions` | 17.2% |
/// | `allowances.securities` | holding-period allowance, category `standard` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritiesConfig {
    pub flat_income_rate: Percent,
    pub social_rate: Percent,
    pub allowances: AllowanceTable,
}

impl SecuritiesConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            flat_income_rate: tables.rate("flat_tax_income")?,
            social_rate: tables.rate("social_contributions")?,
            allowances: tables.allowance_table("securities")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritiesInput {
    pub gain: Decimal,
    pub regime: SecuritiesRegime,
    /// Holding of the shares; absent means no allowance.
    pub holding: Option<Holding>,
    /// Household marginal rate, required for the progressive option.
    pub marginal_rate: Option<Percent>,
}

impl SecuritiesInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_within_limit(self.gain, "gain")?;
        if let Some(rate) = self.marginal_rate {
            require_percent_range(rate, "marginal_rate")?;
        }
        if self.regime == SecuritiesRegime::Progressive && self.marginal_rate.is_none() {
            return Err(CalculationError::invalid(
                "marginal_rate",
                "required for the progressive option",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SecuritiesGains {
    config: SecuritiesConfig,
}

impl SecuritiesGains {
    pub fn new(config: SecuritiesConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        input: &SecuritiesInput,
    ) -> Result<CalculationResult, CalculationError> {
        input.validate()?;
        if input.gain <= Decimal::ZERO {
            warn!(gain = %input.gain, "securities loss; nothing to tax");
            return Ok(CalculationResult::new(input.gain, Decimal::ZERO, Vec::new()));
        }

        let (income_tax_base, income_rate) = match input.regime {
            SecuritiesRegime::FlatTax => (input.gain, self.config.flat_income_rate),
            SecuritiesRegime::Progressive => {
                let years = input.holding.map_or(0, |h| h.completed_years());
                let allowance = resolve_allowance(&self.config.allowances, "standard", years)?;
                let rate = input.marginal_rate.unwrap_or(Percent::ZERO);
                (allowance.apply(input.gain), rate)
            }
        };

        let income_tax = income_rate.of(income_tax_base);
        let social = self.config.social_rate.of(input.gain);
        debug!(regime = ?input.regime, %income_tax_base, %income_tax, %social, "securities gain");

        Ok(CalculationResult::new(
            input.gain,
            income_tax_base,
            vec![
                TaxComponent::new(TaxComponentKind::IncomeTax, income_tax),
                TaxComponent::new(TaxComponentKind::SocialContributions, social),
            ],
        ))
    }
}
