//! German trade tax (Gewerbesteuer).
//!
//! | Step | Value |
//! |------|-------|
//! | Trade income | profit + additions − deductions |
//! | Rounded | down to whole hundreds |
//! | Taxable | minus the allowance for the legal form |
//! | Base amount (Messbetrag) | taxable × 3.5% |
//! | Trade tax | base amount × municipal multiplier (Hebesatz) |
//!
//! Sole proprietors and partners may credit up to four times the base amount
//! against their income tax, limited to the trade tax actually paid.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{MultiplierTable, MunicipalMultiplier};
use crate::calculations::common::{non_negative, round_down_to};
use crate::calculations::{CalculationError, MultiplierSpec, resolve_allowance};
use crate::input::{or_zero, require_non_negative_opt, require_within_limit};
use crate::models::{AllowanceTable, CalculationResult, Percent, TaxComponent, TaxComponentKind, YearTables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalForm {
    SoleProprietor,
    Partnership,
    Corporation,
}

impl LegalForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoleProprietor => "sole_proprietor",
            Self::Partnership => "partnership",
            Self::Corporation => "corporation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sole_proprietor" | "sole" => Some(Self::SoleProprietor),
            "partnership" => Some(Self::Partnership),
            "corporation" | "gmbh" | "ag" => Some(Self::Corporation),
            _ => None,
        }
    }

    /// Whether the owners pay income tax and may credit trade tax against it.
    pub fn is_transparent(&self) -> bool {
        !matches!(self, Self::Corporation)
    }
}

impl fmt::Display for LegalForm {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `allowances.trade_tax_allowances` | allowance by legal form |
/// | `rates.trade_tax_base_rate` | Steuermesszahl, 3.5% |
/// | `amounts.trade_tax_credit_factor` | income tax credit factor, 4 |
/// | `amounts.trade_tax_minimum_multiplier` | lowest legal Hebesatz |
/// | `multipliers.trade_tax` | Hebesatz by municipality |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTaxConfig {
    pub allowances: AllowanceTable,
    pub base_rate: Percent,
    pub credit_factor: Decimal,
    pub minimum_multiplier: Percent,
    pub multipliers: MultiplierTable,
}

impl TradeTaxConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            allowances: tables.allowance_table("trade_tax_allowances")?,
            base_rate: tables.rate("trade_tax_base_rate")?,
            credit_factor: tables.amount("trade_tax_credit_factor")?,
            minimum_multiplier: Percent::new(tables.amount("trade_tax_minimum_multiplier")?),
            multipliers: MultiplierTable::from_year_tables(tables, "trade_tax"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTaxInput {
    /// Profit from the trade, as determined for income or corporation tax.
    pub profit: Decimal,
    pub legal_form: LegalForm,
    /// Hebesatz, e.g. 490 for 490%, or the municipality levying it.
    pub multiplier: MunicipalMultiplier,
    /// Hinzurechnungen. Empty means zero.
    pub additions: Option<Decimal>,
    /// Kürzungen. Empty means zero.
    pub deductions: Option<Decimal>,
}

impl TradeTaxInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_within_limit(self.profit, "profit")?;
        require_non_negative_opt(self.additions, "additions")?;
        require_non_negative_opt(self.deductions, "deductions")?;
        self.multiplier.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTaxAssessment {
    pub legal_form: LegalForm,
    /// Trade income rounded down to hundreds, before the allowance.
    pub trade_income: Decimal,
    pub allowance: Decimal,
    /// Steuermessbetrag.
    pub base_amount: Decimal,
    pub multiplier: Percent,
    /// Amount creditable against the owners' income tax.
    pub income_tax_credit: Decimal,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct TradeTax {
    config: TradeTaxConfig,
}

impl TradeTax {
    pub fn new(config: TradeTaxConfig) -> Self {
        Self { config }
    }

    /// # Errors
    ///
    /// [`CalculationError::InvalidInput`] for negative additions, deductions
    /// or multiplier; [`CalculationError::OutOfDomain`] when the legal form has
    /// no allowance entry or the municipality is unknown.
    pub fn calculate(
        &self,
        input: &TradeTaxInput,
    ) -> Result<TradeTaxAssessment, CalculationError> {
        input.validate()?;
        let multiplier = self.config.multipliers.resolve(&input.multiplier)?;
        if multiplier < self.config.minimum_multiplier {
            warn!(
                %multiplier,
                minimum = %self.config.minimum_multiplier,
                "multiplier below the legal minimum"
            );
        }

        let income = input.profit + or_zero(input.additions, "additions")
            - or_zero(input.deductions, "deductions");
        let trade_income = round_down_to(non_negative(income), Decimal::ONE_HUNDRED);

        let allowance = resolve_allowance(&self.config.allowances, input.legal_form.as_str(), 0)?;
        let taxable = allowance.apply(trade_income);

        let spec = MultiplierSpec::new(self.config.base_rate, multiplier);
        let base_amount = self.config.base_rate.of(taxable);
        let tax = spec.apply(taxable);
        let income_tax_credit = if input.legal_form.is_transparent() {
            (base_amount * self.config.credit_factor).min(tax)
        } else {
            Decimal::ZERO
        };
        debug!(%trade_income, %taxable, %base_amount, %tax, %income_tax_credit, "trade tax");

        Ok(TradeTaxAssessment {
            legal_form: input.legal_form,
            trade_income,
            allowance: trade_income - taxable,
            base_amount,
            multiplier,
            income_tax_credit,
            result: CalculationResult::new(
                input.profit,
                taxable,
                vec![TaxComponent::new(TaxComponentKind::TradeTax, tax)],
            ),
        })
    }
}
