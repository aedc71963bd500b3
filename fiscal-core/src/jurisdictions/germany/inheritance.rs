//! German inheritance and gift tax (Erbschaft- und Schenkungsteuer).
//!
//! The relationship between donor and recipient fixes both the tax class
//! (I, II or III) and the personal allowance. Gifts received from the same
//! person in the previous ten years are added to the value before the
//! allowance is deducted. The taxable value is rounded down to whole hundreds
//! and taxed with the class's bracket schedule.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::round_down_to;
use crate::calculations::{CalculationError, compute_bracket_tax, resolve_allowance};
use crate::input::{or_zero, require_non_negative, require_non_negative_opt};
use crate::models::{
    Allowance, AllowanceTable, BracketTable, CalculationResult, TaxComponent, TaxComponentKind,
    YearTables,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Inheritance,
    Gift,
}

/// Recipient's relationship to the deceased or donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Spouse,
    Child,
    Grandchild,
    Parent,
    Sibling,
    NieceNephew,
    ParentInLaw,
    ChildInLaw,
    DivorcedSpouse,
    Other,
    /// Church, charity or other tax-privileged body.
    Charity,
}

impl Relationship {
    pub const ALL: [Relationship; 11] = [
        Relationship::Spouse,
        Relationship::Child,
        Relationship::Grandchild,
        Relationship::Parent,
        Relationship::Sibling,
        Relationship::NieceNephew,
        Relationship::ParentInLaw,
        Relationship::ChildInLaw,
        Relationship::DivorcedSpouse,
        Relationship::Other,
        Relationship::Charity,
    ];

    /// Category name used in the allowance tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::Child => "child",
            Self::Grandchild => "grandchild",
            Self::Parent => "parent",
            Self::Sibling => "sibling",
            Self::NieceNephew => "niece_nephew",
            Self::ParentInLaw => "parent_in_law",
            Self::ChildInLaw => "child_in_law",
            Self::DivorcedSpouse => "divorced_spouse",
            Self::Other => "other",
            Self::Charity => "charity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|r| r.as_str() == normalized)
    }

    /// Tax class for this relationship. Charities have none.
    pub fn tax_class(
        &self,
        kind: TransferKind,
    ) -> Option<TaxClass> {
        match self {
            Self::Spouse | Self::Child | Self::Grandchild => Some(TaxClass::I),
            Self::Parent => match kind {
                TransferKind::Inheritance => Some(TaxClass::I),
                TransferKind::Gift => Some(TaxClass::II),
            },
            Self::Sibling
            | Self::NieceNephew
            | Self::ParentInLaw
            | Self::ChildInLaw
            | Self::DivorcedSpouse => Some(TaxClass::II),
            Self::Other => Some(TaxClass::III),
            Self::Charity => None,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxClass {
    I,
    II,
    III,
}

impl TaxClass {
    /// Name of the bracket table for this class.
    pub fn schedule(&self) -> &'static str {
        match self {
            Self::I => "inheritance_class_i",
            Self::II => "inheritance_class_ii",
            Self::III => "inheritance_class_iii",
        }
    }
}

/// | Year-table entry | Use |
/// |------------------|-----|
/// | `allowances.inheritance_allowances` | personal allowance by relationship |
/// | `allowances.gift_allowances` | same, for gifts |
/// | `brackets.inheritance_class_i`, `_ii`, `_iii` | rate schedules |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceConfig {
    pub inheritance_allowances: AllowanceTable,
    pub gift_allowances: AllowanceTable,
    pub class_i: BracketTable,
    pub class_ii: BracketTable,
    pub class_iii: BracketTable,
}

impl InheritanceConfig {
    pub fn from_year_tables(tables: &YearTables) -> Result<Self, CalculationError> {
        Ok(Self {
            inheritance_allowances: tables.allowance_table("inheritance_allowances")?,
            gift_allowances: tables.allowance_table("gift_allowances")?,
            class_i: tables.bracket_table(TaxClass::I.schedule())?.clone(),
            class_ii: tables.bracket_table(TaxClass::II.schedule())?.clone(),
            class_iii: tables.bracket_table(TaxClass::III.schedule())?.clone(),
        })
    }

    fn brackets(
        &self,
        class: TaxClass,
    ) -> &BracketTable {
        match class {
            TaxClass::I => &self.class_i,
            TaxClass::II => &self.class_ii,
            TaxClass::III => &self.class_iii,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceInput {
    /// Value of the acquisition after debts and funeral costs.
    pub value: Decimal,
    pub relationship: Relationship,
    pub kind: TransferKind,
    /// Gifts from the same person within the last ten years. Empty means zero.
    pub prior_gifts: Option<Decimal>,
}

impl InheritanceInput {
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_non_negative(self.value, "value")?;
        require_non_negative_opt(self.prior_gifts, "prior_gifts")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceAssessment {
    /// `None` for fully exempt recipients.
    pub tax_class: Option<TaxClass>,
    pub allowance: Decimal,
    pub result: CalculationResult,
}

#[derive(Debug, Clone)]
pub struct InheritanceTax {
    config: InheritanceConfig,
}

impl InheritanceTax {
    pub fn new(config: InheritanceConfig) -> Self {
        Self { config }
    }

    /// # Errors
    ///
    /// [`CalculationError::InvalidInput`] for negative values and
    /// [`CalculationError::OutOfDomain`] when the relationship is missing from
    /// the allowance table.
    pub fn calculate(
        &self,
        input: &InheritanceInput,
    ) -> Result<InheritanceAssessment, CalculationError> {
        input.validate()?;

        let table = match input.kind {
            TransferKind::Inheritance => &self.config.inheritance_allowances,
            TransferKind::Gift => &self.config.gift_allowances,
        };
        let allowance = resolve_allowance(table, input.relationship.as_str(), 0)?;
        let tax_class = input.relationship.tax_class(input.kind);

        let total_value = input.value + or_zero(input.prior_gifts, "prior_gifts");
        let class = match (allowance, tax_class) {
            (Allowance::FullExemption, _) | (_, None) => {
                debug!(relationship = %input.relationship, "recipient fully exempt");
                return Ok(InheritanceAssessment {
                    tax_class,
                    allowance: total_value,
                    result: CalculationResult::exempt(total_value),
                });
            }
            (_, Some(class)) => class,
        };

        let allowance_amount = total_value - allowance.apply(total_value);
        let taxable = round_down_to(allowance.apply(total_value), Decimal::ONE_HUNDRED);
        let tax = compute_bracket_tax(taxable, self.config.brackets(class).brackets());
        debug!(?class, %allowance_amount, %taxable, %tax, "inheritance tax");

        Ok(InheritanceAssessment {
            tax_class: Some(class),
            allowance: allowance_amount,
            result: CalculationResult::new(
                total_value,
                taxable,
                vec![TaxComponent::new(TaxComponentKind::InheritanceTax, tax)],
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{AllowanceRule, Percent, TaxBracket};

    fn schedule(rates: [Decimal; 7]) -> BracketTable {
        let bounds = [
            dec!(0),
            dec!(75000),
            dec!(300000),
            dec!(600000),
            dec!(6000000),
            dec!(13000000),
            dec!(26000000),
        ];
        let brackets = bounds
            .iter()
            .enumerate()
            .map(|(i, &lower)| {
                TaxBracket::new(lower, bounds.get(i + 1).copied(), Percent::new(rates[i]))
            })
            .collect();
        BracketTable::new(brackets).unwrap()
    }

    fn allowances(
        name: &str,
        parent: Decimal,
    ) -> AllowanceTable {
        let exempt = |amount| AllowanceRule::ExemptAmount { amount };
        let mut rules = BTreeMap::from([
            ("spouse".to_string(), exempt(dec!(500000))),
            ("child".to_string(), exempt(dec!(400000))),
            ("grandchild".to_string(), exempt(dec!(200000))),
            ("parent".to_string(), exempt(parent)),
            ("sibling".to_string(), exempt(dec!(20000))),
            ("other".to_string(), exempt(dec!(20000))),
            ("charity".to_string(), AllowanceRule::FullExemption),
        ]);
        rules.insert("niece_nephew".to_string(), exempt(dec!(20000)));
        AllowanceTable::new(name, rules)
    }

    fn calculator() -> InheritanceTax {
        InheritanceTax::new(InheritanceConfig {
            inheritance_allowances: allowances("inheritance_allowances", dec!(100000)),
            gift_allowances: allowances("gift_allowances", dec!(20000)),
            class_i: schedule([dec!(7), dec!(11), dec!(15), dec!(19), dec!(23), dec!(27), dec!(30)]),
            class_ii: schedule([dec!(15), dec!(20), dec!(25), dec!(30), dec!(35), dec!(40), dec!(43)]),
            class_iii: schedule([dec!(30), dec!(30), dec!(30), dec!(30), dec!(50), dec!(50), dec!(50)]),
        })
    }

    fn inheritance(
        value: Decimal,
        relationship: Relationship,
    ) -> InheritanceInput {
        InheritanceInput {
            value,
            relationship,
            kind: TransferKind::Inheritance,
            prior_gifts: None,
        }
    }

    #[test]
    fn child_inherits_below_allowance() {
        let assessment = calculator()
            .calculate(&inheritance(dec!(350000), Relationship::Child))
            .unwrap();

        assert_eq!(assessment.tax_class, Some(TaxClass::I));
        assert_eq!(assessment.result.total_tax, dec!(0));
        assert!(!assessment.result.exempt);
    }

    #[test]
    fn child_inherits_above_allowance() {
        let assessment = calculator()
            .calculate(&inheritance(dec!(600000), Relationship::Child))
            .unwrap();

        // 200000 taxable: 75000 × 7% + 125000 × 11%
        assert_eq!(assessment.allowance, dec!(400000));
        assert_eq!(assessment.result.taxable_base, dec!(200000));
        assert_eq!(assessment.result.total_tax, dec!(19000));
    }

    #[test]
    fn taxable_value_rounds_down_to_hundreds() {
        let assessment = calculator()
            .calculate(&inheritance(dec!(30099.99), Relationship::Sibling))
            .unwrap();

        assert_eq!(assessment.result.taxable_base, dec!(10000));
        assert_eq!(assessment.result.total_tax, dec!(1500));
    }

    #[test]
    fn unrelated_heir_pays_class_iii() {
        let assessment = calculator()
            .calculate(&inheritance(dec!(120000), Relationship::Other))
            .unwrap();

        assert_eq!(assessment.tax_class, Some(TaxClass::III));
        assert_eq!(assessment.result.total_tax, dec!(30000));
    }

    #[test]
    fn parent_is_class_ii_for_gifts() {
        let input = InheritanceInput {
            kind: TransferKind::Gift,
            ..inheritance(dec!(50000), Relationship::Parent)
        };

        let assessment = calculator().calculate(&input).unwrap();

        assert_eq!(assessment.tax_class, Some(TaxClass::II));
        assert_eq!(assessment.allowance, dec!(20000));
        assert_eq!(assessment.result.total_tax, dec!(4500));
    }

    #[test]
    fn prior_gifts_use_up_the_allowance() {
        let input = InheritanceInput {
            prior_gifts: Some(dec!(400000)),
            ..inheritance(dec!(100000), Relationship::Child)
        };

        let assessment = calculator().calculate(&input).unwrap();

        assert_eq!(assessment.result.taxable_base, dec!(100000));
        assert_eq!(assessment.result.total_tax, dec!(8000));
    }

    #[test]
    fn charity_is_fully_exempt() {
        let assessment = calculator()
            .calculate(&inheritance(dec!(5000000), Relationship::Charity))
            .unwrap();

        assert_eq!(assessment.tax_class, None);
        assert!(assessment.result.exempt);
        assert_eq!(assessment.result.total_tax, dec!(0));
    }

    #[test]
    fn relationship_missing_from_table_is_out_of_domain() {
        let result = calculator().calculate(&inheritance(dec!(100000), Relationship::ChildInLaw));

        assert_eq!(
            result,
            Err(CalculationError::out_of_domain(
                "inheritance_allowances",
                "child_in_law"
            ))
        );
    }

    #[test]
    fn relationship_parse_accepts_dashes() {
        assert_eq!(
            Relationship::parse("Niece-Nephew"),
            Some(Relationship::NieceNephew)
        );
        assert_eq!(Relationship::parse("cousin"), None);
    }
}
