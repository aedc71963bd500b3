use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Percent;
use crate::calculations::common::round_half_up;

/// The kind of levy a result line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxComponentKind {
    IncomeTax,
    SolidaritySurcharge,
    ChurchTax,
    SocialContributions,
    CapitalGainsTax,
    InheritanceTax,
    TradeTax,
    PropertyTax,
    Vat,
    StampDuty,
    RegionalSurcharge,
    MunicipalSurcharge,
}

impl TaxComponentKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::IncomeTax => "income tax",
            Self::SolidaritySurcharge => "solidarity surcharge",
            Self::ChurchTax => "church tax",
            Self::SocialContributions => "social contributions",
            Self::CapitalGainsTax => "capital gains tax",
            Self::InheritanceTax => "inheritance tax",
            Self::TradeTax => "trade tax",
            Self::PropertyTax => "property tax",
            Self::Vat => "VAT",
            Self::StampDuty => "stamp duty",
            Self::RegionalSurcharge => "regional surcharge",
            Self::MunicipalSurcharge => "municipal surcharge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComponent {
    pub kind: TaxComponentKind,
    pub amount: Decimal,
}

impl TaxComponent {
    pub fn new(
        kind: TaxComponentKind,
        amount: Decimal,
    ) -> Self {
        Self {
            kind,
            amount: round_half_up(amount),
        }
    }
}

/// Outcome of one calculator run.
///
/// Built fresh for every calculation and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The amount the calculation started from (income, gain, estate, price…).
    pub gross_amount: Decimal,

    /// Base left after allowances, before rates were applied.
    pub taxable_base: Decimal,

    /// Tax by component, in the order they were computed.
    pub components: Vec<TaxComponent>,

    /// Sum of all components.
    pub total_tax: Decimal,

    /// `gross_amount - total_tax`.
    pub net_amount: Decimal,

    /// `total_tax / gross_amount`, zero when the gross amount is zero.
    pub effective_rate: Percent,

    /// Set when a full exemption ended the calculation before any rate applied.
    pub exempt: bool,
}

impl CalculationResult {
    pub fn new(
        gross_amount: Decimal,
        taxable_base: Decimal,
        components: Vec<TaxComponent>,
    ) -> Self {
        let total_tax = components.iter().map(|c| c.amount).sum::<Decimal>();
        let effective_rate = if gross_amount > Decimal::ZERO {
            Percent::from_fraction(total_tax / gross_amount)
        } else {
            Percent::ZERO
        };

        Self {
            gross_amount,
            taxable_base,
            components,
            total_tax,
            net_amount: gross_amount - total_tax,
            effective_rate: Percent::new(effective_rate.value().round_dp(4)),
            exempt: false,
        }
    }

    /// A zero-tax result for a fully exempt case.
    pub fn exempt(gross_amount: Decimal) -> Self {
        Self {
            exempt: true,
            ..Self::new(gross_amount, Decimal::ZERO, Vec::new())
        }
    }

    /// Amount of the given component, zero when absent.
    pub fn component(
        &self,
        kind: TaxComponentKind,
    ) -> Decimal {
        self.components
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn new_sums_components_and_derives_net() {
        let result = CalculationResult::new(
            dec!(25000),
            dec!(25000),
            vec![
                TaxComponent::new(TaxComponentKind::CapitalGainsTax, dec!(6250)),
                TaxComponent::new(TaxComponentKind::SolidaritySurcharge, dec!(343.75)),
            ],
        );

        assert_eq!(result.total_tax, dec!(6593.75));
        assert_eq!(result.net_amount, dec!(18406.25));
        assert_eq!(result.effective_rate, Percent::new(dec!(26.375)));
        assert!(!result.exempt);
    }

    #[test]
    fn new_with_zero_gross_has_zero_effective_rate() {
        let result = CalculationResult::new(dec!(0), dec!(0), vec![]);

        assert_eq!(result.effective_rate, Percent::ZERO);
    }

    #[test]
    fn exempt_has_no_tax() {
        let result = CalculationResult::exempt(dec!(350000));

        assert!(result.exempt);
        assert_eq!(result.total_tax, dec!(0));
        assert_eq!(result.net_amount, dec!(350000));
    }

    #[test]
    fn component_returns_zero_when_missing() {
        let result = CalculationResult::exempt(dec!(100));

        assert_eq!(result.component(TaxComponentKind::ChurchTax), dec!(0));
    }

    #[test]
    fn component_rounds_to_cents() {
        let component = TaxComponent::new(TaxComponentKind::Vat, dec!(33.3333));

        assert_eq!(component.amount, dec!(33.33));
    }
}
