use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Percent;
use crate::calculations::common::max;

/// The reduction a resolved allowance applies to a gross base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Allowance {
    /// A fixed amount subtracted from the base.
    ExemptAmount { amount: Decimal },
    /// A percentage of the base removed before rates apply.
    PercentReduction { percent: Percent },
    /// No tax at all; the calculation stops here.
    FullExemption,
}

impl Allowance {
    pub const NONE: Allowance = Allowance::PercentReduction {
        percent: Percent::ZERO,
    };

    /// Taxable base left after the allowance, never below zero.
    pub fn apply(
        &self,
        base: Decimal,
    ) -> Decimal {
        match self {
            Self::ExemptAmount { amount } => max(base - amount, Decimal::ZERO),
            Self::PercentReduction { percent } => {
                max(base - percent.of(base), Decimal::ZERO)
            }
            Self::FullExemption => Decimal::ZERO,
        }
    }

    pub fn is_full_exemption(&self) -> bool {
        matches!(self, Self::FullExemption)
    }
}

/// One run of years sharing the same yearly allowance increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceStep {
    /// First year of holding (1-based, inclusive) earning `percent_per_year`.
    pub from_year: u32,
    /// Last year of holding (inclusive) earning `percent_per_year`.
    pub to_year: u32,
    pub percent_per_year: Percent,
}

/// Holding-period reduction that grows stepwise with completed years.
///
/// No reduction is granted up to and including `floor_year`; each later year
/// covered by a step adds that step's increment, and the total never exceeds
/// `cap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingPeriodSchedule {
    pub floor_year: u32,
    pub steps: Vec<AllowanceStep>,
    pub cap: Percent,
}

impl HoldingPeriodSchedule {
    /// Reduction earned after `held_years` completed years of holding.
    pub fn percent_for(
        &self,
        held_years: u32,
    ) -> Percent {
        if held_years <= self.floor_year {
            return Percent::ZERO;
        }

        let earned = self
            .steps
            .iter()
            .map(|step| {
                let first = step.from_year.max(self.floor_year + 1);
                let last = step.to_year.min(held_years);
                if last < first {
                    Decimal::ZERO
                } else {
                    step.percent_per_year.value() * Decimal::from(last - first + 1)
                }
            })
            .sum::<Decimal>();

        Percent::new(earned.min(self.cap.value()))
    }

    /// First year of holding at which the cap is reached, if ever.
    pub fn ceiling_year(&self) -> Option<u32> {
        let last_year = self.steps.iter().map(|s| s.to_year).max()?;
        (self.floor_year + 1..=last_year).find(|&year| self.percent_for(year) >= self.cap)
    }
}

/// A single entry in an allowance lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllowanceRule {
    ExemptAmount { amount: Decimal },
    HoldingPeriod(HoldingPeriodSchedule),
    FullExemption,
}

/// A named lookup from category (relationship, legal form, asset class…)
/// to the allowance it earns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceTable {
    pub name: String,
    pub rules: BTreeMap<String, AllowanceRule>,
}

impl AllowanceTable {
    pub fn new(
        name: impl Into<String>,
        rules: BTreeMap<String, AllowanceRule>,
    ) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn rule(
        &self,
        category: &str,
    ) -> Option<&AllowanceRule> {
        self.rules.get(category)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn step(
        from_year: u32,
        to_year: u32,
        percent: Decimal,
    ) -> AllowanceStep {
        AllowanceStep {
            from_year,
            to_year,
            percent_per_year: Percent::new(percent),
        }
    }

    fn real_estate_schedule() -> HoldingPeriodSchedule {
        HoldingPeriodSchedule {
            floor_year: 5,
            steps: vec![step(6, 21, dec!(6)), step(22, 22, dec!(4))],
            cap: Percent::HUNDRED,
        }
    }

    fn securities_schedule() -> HoldingPeriodSchedule {
        HoldingPeriodSchedule {
            floor_year: 1,
            steps: vec![step(2, 2, dec!(50)), step(8, 8, dec!(15))],
            cap: Percent::new(dec!(65)),
        }
    }

    // =========================================================================
    // Allowance::apply tests
    // =========================================================================

    #[test]
    fn exempt_amount_subtracts_from_base() {
        let allowance = Allowance::ExemptAmount {
            amount: dec!(400000),
        };

        assert_eq!(allowance.apply(dec!(500000)), dec!(100000));
    }

    #[test]
    fn exempt_amount_never_goes_negative() {
        let allowance = Allowance::ExemptAmount {
            amount: dec!(400000),
        };

        assert_eq!(allowance.apply(dec!(150000)), dec!(0));
    }

    #[test]
    fn percent_reduction_scales_base() {
        let allowance = Allowance::PercentReduction {
            percent: Percent::new(dec!(36)),
        };

        assert_eq!(allowance.apply(dec!(100000)), dec!(64000));
    }

    #[test]
    fn full_exemption_zeroes_base() {
        assert_eq!(Allowance::FullExemption.apply(dec!(100000)), dec!(0));
        assert!(Allowance::FullExemption.is_full_exemption());
    }

    // =========================================================================
    // HoldingPeriodSchedule tests
    // =========================================================================

    #[test]
    fn schedule_is_zero_up_to_floor_year() {
        let schedule = real_estate_schedule();

        assert_eq!(schedule.percent_for(0), Percent::ZERO);
        assert_eq!(schedule.percent_for(5), Percent::ZERO);
    }

    #[test]
    fn schedule_steps_linearly_per_year() {
        let schedule = real_estate_schedule();

        assert_eq!(schedule.percent_for(6), Percent::new(dec!(6)));
        assert_eq!(schedule.percent_for(10), Percent::new(dec!(30)));
        assert_eq!(schedule.percent_for(21), Percent::new(dec!(96)));
    }

    #[test]
    fn schedule_reaches_cap_at_ceiling_year_and_stays() {
        let schedule = real_estate_schedule();

        assert_eq!(schedule.percent_for(22), Percent::HUNDRED);
        assert_eq!(schedule.percent_for(40), Percent::HUNDRED);
        assert_eq!(schedule.ceiling_year(), Some(22));
    }

    #[test]
    fn securities_schedule_jumps_then_caps_at_65() {
        let schedule = securities_schedule();

        assert_eq!(schedule.percent_for(1), Percent::ZERO);
        assert_eq!(schedule.percent_for(2), Percent::new(dec!(50)));
        assert_eq!(schedule.percent_for(7), Percent::new(dec!(50)));
        assert_eq!(schedule.percent_for(8), Percent::new(dec!(65)));
        assert_eq!(schedule.percent_for(30), Percent::new(dec!(65)));
        assert_eq!(schedule.ceiling_year(), Some(8));
    }

    #[test]
    fn schedule_cap_truncates_overlapping_steps() {
        let schedule = HoldingPeriodSchedule {
            floor_year: 0,
            steps: vec![step(1, 10, dec!(15))],
            cap: Percent::HUNDRED,
        };

        assert_eq!(schedule.percent_for(6), Percent::new(dec!(90)));
        assert_eq!(schedule.percent_for(7), Percent::HUNDRED);
    }
}
