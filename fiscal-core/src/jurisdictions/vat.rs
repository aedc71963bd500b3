//! VAT / sales-tax calculator shared by every jurisdiction.
//!
//! The rate is either picked by kind from the jurisdiction's tables
//! (`standard`, `reduced`, `second_reduced`, `super_reduced`, `zero`) or given
//! explicitly, then applied with the flat-rate transformer.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::calculations::{CalculationError, Direction, FlatRateSpec};
use crate::input::require_non_negative;
use crate::models::{
    CalculationResult, Country, Percent, TaxComponent, TaxComponentKind, YearTables,
};

/// Which rate to charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatRateSelection {
    /// A rate kind from the jurisdiction's table, e.g. `"reduced"`.
    Kind(String),
    /// A rate given directly.
    Explicit(Percent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatInput {
    /// Net amount for [`Direction::Add`], gross amount for [`Direction::Remove`].
    pub amount: Decimal,
    pub rate: VatRateSelection,
    pub direction: Direction,
}

impl VatInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.amount, "amount")?;
        if let VatRateSelection::Explicit(rate) = &self.rate {
            FlatRateSpec::new(*rate, self.direction).validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatConfig {
    pub country: Country,
    pub rates: BTreeMap<String, Percent>,
}

impl VatConfig {
    /// Reads the `vat` section of the year tables.
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        if tables.vat.is_empty() {
            return Err(CalculationError::missing("vat"));
        }
        Ok(Self {
            country: tables.country,
            rates: tables.vat.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatResult {
    pub rate: Percent,
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct VatCalculator {
    config: VatConfig,
}

impl VatCalculator {
    pub fn new(config: VatConfig) -> Self {
        Self { config }
    }

    /// Resolves a rate selection against the configured table.
    pub fn rate_for(
        &self,
        selection: &VatRateSelection,
    ) -> Result<Percent, CalculationError> {
        match selection {
            VatRateSelection::Explicit(rate) => Ok(*rate),
            VatRateSelection::Kind(kind) => self
                .config
                .rates
                .get(kind.as_str())
                .copied()
                .ok_or_else(|| {
                    CalculationError::out_of_domain(
                        format!("{} VAT rates", self.config.country),
                        kind.as_str(),
                    )
                }),
        }
    }

    /// Applies the selected rate to the input amount.
    ///
    /// # Arguments
    ///
    /// * `input` - The amount, the rate to charge and whether the amount is
    ///   net or gross
    ///
    /// # Returns
    ///
    /// The rate used with net, VAT and gross. Only the derived side is
    /// rounded to cents, so `net + vat == gross` holds exactly.
    ///
    /// # Errors
    ///
    /// [`CalculationError::InvalidInput`] for a negative or oversized amount
    /// or rate, [`CalculationError::OutOfDomain`] for an unknown rate kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use rust_decimal_macros::dec;
    /// use fiscal_core::calculations::Direction;
    /// use fiscal_core::jurisdictions::{VatCalculator, VatConfig, VatInput, VatRateSelection};
    /// use fiscal_core::{Country, Percent};
    ///
    /// let calculator = VatCalculator::new(VatConfig {
    ///     country: Country::Germany,
    ///     rates: BTreeMap::from([("standard".to_string(), Percent::new(dec!(19)))]),
    /// });
    ///
    /// let vat = calculator
    ///     .calculate(&VatInput {
    ///         amount: dec!(119),
    ///         rate: VatRateSelection::Kind("standard".to_string()),
    ///         direction: Direction::Remove,
    ///     })
    ///     .unwrap();
    /// assert_eq!(vat.net, dec!(100));
    /// assert_eq!(vat.vat, dec!(19));
    /// ```
    pub fn calculate(
        &self,
        input: &VatInput,
    ) -> Result<VatResult, CalculationError> {
        input.validate()?;
        let rate = self.rate_for(&input.rate)?;
        let breakdown = FlatRateSpec::new(rate, input.direction).apply(input.amount);

        // Round the derived side only so net + vat == gross to the cent.
        let (net, vat, gross) = match input.direction {
            Direction::Add => {
                let vat = round_half_up(breakdown.tax);
                (breakdown.net, vat, breakdown.net + vat)
            }
            Direction::Remove => {
                let net = round_half_up(breakdown.net);
                (net, breakdown.gross - net, breakdown.gross)
            }
        };
        debug!(country = %self.config.country, %rate, %net, %vat, %gross, "VAT calculated");

        let result = CalculationResult::new(
            gross,
            net,
            vec![TaxComponent::new(TaxComponentKind::Vat, vat)],
        );

        Ok(VatResult {
            rate,
            net,
            vat,
            gross,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn french_vat() -> VatCalculator {
        VatCalculator::new(VatConfig {
            country: Country::France,
            rates: BTreeMap::from([
                ("standard".to_string(), Percent::new(dec!(20))),
                ("reduced".to_string(), Percent::new(dec!(10))),
                ("second_reduced".to_string(), Percent::new(dec!(5.5))),
                ("super_reduced".to_string(), Percent::new(dec!(2.1))),
            ]),
        })
    }

    fn input(
        amount: Decimal,
        kind: &str,
        direction: Direction,
    ) -> VatInput {
        VatInput {
            amount,
            rate: VatRateSelection::Kind(kind.to_string()),
            direction,
        }
    }

    #[test]
    fn add_vat_to_net_1000_at_20_percent() {
        let result = french_vat()
            .calculate(&input(dec!(1000), "standard", Direction::Add))
            .unwrap();

        assert_eq!(result.vat, dec!(200.00));
        assert_eq!(result.gross, dec!(1200.00));
        assert_eq!(result.result.total_tax, dec!(200.00));
    }

    #[test]
    fn remove_vat_from_gross_1200_at_20_percent() {
        let result = french_vat()
            .calculate(&input(dec!(1200), "standard", Direction::Remove))
            .unwrap();

        assert_eq!(result.net, dec!(1000.00));
        assert_eq!(result.vat, dec!(200.00));
    }

    #[test]
    fn remove_keeps_cents_consistent() {
        let result = french_vat()
            .calculate(&input(dec!(99.99), "second_reduced", Direction::Remove))
            .unwrap();

        // 99.99 / 1.055 = 94.7772...
        assert_eq!(result.net, dec!(94.78));
        assert_eq!(result.vat, dec!(5.21));
        assert_eq!(result.net + result.vat, result.gross);
    }

    #[test]
    fn explicit_rate_bypasses_table() {
        let calculator = french_vat();
        let input = VatInput {
            amount: dec!(50),
            rate: VatRateSelection::Explicit(Percent::new(dec!(8.5))),
            direction: Direction::Add,
        };

        let result = calculator.calculate(&input).unwrap();

        assert_eq!(result.vat, dec!(4.25));
        assert_eq!(result.rate, Percent::new(dec!(8.5)));
    }

    #[test]
    fn unknown_kind_is_out_of_domain() {
        let result = french_vat().calculate(&input(dec!(10), "zero", Direction::Add));

        assert_eq!(
            result,
            Err(CalculationError::out_of_domain("FR VAT rates", "zero"))
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result = french_vat().calculate(&input(dec!(-10), "standard", Direction::Add));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { field: "amount", .. })
        ));
    }

    #[test]
    fn amount_at_decimal_max_is_rejected() {
        let result = french_vat().calculate(&input(Decimal::MAX, "standard", Direction::Add));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { field: "amount", .. })
        ));
    }

    #[test]
    fn explicit_rate_beyond_limit_is_rejected() {
        let result = french_vat().calculate(&VatInput {
            amount: dec!(1000),
            rate: VatRateSelection::Explicit(Percent::new(Decimal::MAX)),
            direction: Direction::Add,
        });

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { field: "rate", .. })
        ));
    }

    #[test]
    fn config_requires_vat_section() {
        let tables = YearTables::new(Country::Italy, 2025);

        assert_eq!(
            VatConfig::from_year_tables(&tables),
            Err(CalculationError::missing("vat"))
        );
    }
}
