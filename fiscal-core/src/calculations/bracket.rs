//! Progressive bracket tax.
//!
//! Every band the amount passes through is taxed at its own rate on the part
//! of the amount inside it:
//!
//! | Band position relative to amount | Contribution |
//! |----------------------------------|--------------|
//! | entirely below | `rate × width` |
//! | containing the amount | `rate × (amount − lower_bound)` |
//! | above | nothing |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::calculations::compute_bracket_tax;
//! use fiscal_core::{Percent, TaxBracket};
//!
//! let brackets = vec![
//!     TaxBracket::new(dec!(0), Some(dec!(11294)), Percent::new(dec!(0))),
//!     TaxBracket::new(dec!(11294), Some(dec!(28797)), Percent::new(dec!(11))),
//!     TaxBracket::new(dec!(28797), Some(dec!(80956)), Percent::new(dec!(30))),
//!     TaxBracket::new(dec!(80956), None, Percent::new(dec!(41))),
//! ];
//!
//! // 11% × 17,503 + 30% × 1,203
//! assert_eq!(compute_bracket_tax(dec!(30000), &brackets), dec!(2286.23));
//! ```

use rust_decimal::Decimal;

use crate::TaxBracket;
use crate::models::Percent;

/// Tax owed on `amount` under a progressive schedule.
///
/// Brackets must be ascending and contiguous (see
/// [`BracketTable::validate`](crate::BracketTable::validate)). Zero or
/// negative amounts owe nothing. The function is total and has no side
/// effects for amounts up to [`MAX_AMOUNT`](crate::input::MAX_AMOUNT).
///
/// # Arguments
///
/// * `amount` - The taxable amount
/// * `brackets` - The schedule, lowest band first
///
/// # Returns
///
/// The unrounded tax; callers round to cents with
/// [`round_half_up`](super::common::round_half_up).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::compute_bracket_tax;
/// use fiscal_core::{Percent, TaxBracket};
///
/// let brackets = vec![
///     TaxBracket::new(dec!(0), Some(dec!(37700)), Percent::new(dec!(20))),
///     TaxBracket::new(dec!(37700), None, Percent::new(dec!(40))),
/// ];
///
/// assert_eq!(compute_bracket_tax(dec!(-10), &brackets), dec!(0));
/// assert_eq!(compute_bracket_tax(dec!(37700), &brackets), dec!(7540));
/// assert_eq!(compute_bracket_tax(dec!(40000), &brackets), dec!(8460));
/// ```
pub fn compute_bracket_tax(
    amount: Decimal,
    brackets: &[TaxBracket],
) -> Decimal {
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    brackets
        .iter()
        .take_while(|b| amount > b.lower_bound)
        .map(|b| {
            let top = b.upper_bound.map_or(amount, |upper| amount.min(upper));
            b.rate.of(top - b.lower_bound)
        })
        .sum()
}

/// Rate applied to the last unit of `amount`.
///
/// An amount on a boundary belongs to the lower band; zero or negative
/// amounts report the first band's rate.
pub fn marginal_rate(
    amount: Decimal,
    brackets: &[TaxBracket],
) -> Percent {
    brackets
        .iter()
        .find(|b| b.contains(amount))
        .or_else(|| brackets.first())
        .map_or(Percent::ZERO, |b| b.rate)
}

/// Tax attributable to `additional` on top of `existing`.
///
/// Used where a second kind of income stacks on the bands the first one
/// already used.
pub fn compute_marginal_bracket_tax(
    additional: Decimal,
    existing: Decimal,
    brackets: &[TaxBracket],
) -> Decimal {
    compute_bracket_tax(existing + additional, brackets) - compute_bracket_tax(existing, brackets)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::common::round_half_up;
    use crate::input::MAX_AMOUNT;

    fn bracket(
        lower: Decimal,
        upper: Option<Decimal>,
        rate: Decimal,
    ) -> TaxBracket {
        TaxBracket::new(lower, upper, Percent::new(rate))
    }

    /// French schedule with 11,294 / 28,797 / 80,956 / 174,137 bands.
    fn french_brackets() -> Vec<TaxBracket> {
        vec![
            bracket(dec!(0), Some(dec!(11294)), dec!(0)),
            bracket(dec!(11294), Some(dec!(28797)), dec!(11)),
            bracket(dec!(28797), Some(dec!(80956)), dec!(30)),
            bracket(dec!(80956), Some(dec!(174137)), dec!(41)),
            bracket(dec!(174137), None, dec!(45)),
        ]
    }

    fn sample_amounts() -> Vec<Decimal> {
        (0..=60)
            .map(|i| Decimal::from(i) * dec!(3500))
            .chain([dec!(11294), dec!(28797), dec!(80956), dec!(174137)])
            .collect()
    }

    // =========================================================================
    // compute_bracket_tax tests
    // =========================================================================

    #[test]
    fn zero_amount_owes_nothing() {
        assert_eq!(compute_bracket_tax(dec!(0), &french_brackets()), dec!(0));
    }

    #[test]
    fn negative_amount_owes_nothing() {
        assert_eq!(
            compute_bracket_tax(dec!(-5000), &french_brackets()),
            dec!(0)
        );
    }

    #[test]
    fn empty_schedule_owes_nothing() {
        assert_eq!(compute_bracket_tax(dec!(5000), &[]), dec!(0));
    }

    #[test]
    fn amount_in_zero_rate_band_owes_nothing() {
        assert_eq!(
            compute_bracket_tax(dec!(11000), &french_brackets()),
            dec!(0)
        );
    }

    #[test]
    fn french_single_filer_30000_matches_manual_sum() {
        let brackets = french_brackets();

        let tax = compute_bracket_tax(dec!(30000), &brackets);

        let manual = dec!(0) * dec!(11294)
            + dec!(0.11) * (dec!(28797) - dec!(11294))
            + dec!(0.30) * (dec!(30000) - dec!(28797));
        assert_eq!(tax, manual);
        assert_eq!(round_half_up(tax), dec!(2286.23));
    }

    #[test]
    fn unbounded_top_band_taxes_remainder() {
        let brackets = french_brackets();

        let tax = compute_bracket_tax(dec!(200000), &brackets);

        // 1925.33 + 15647.70 + 38204.21 + 11638.35
        assert_eq!(round_half_up(tax), dec!(67415.59));
    }

    #[test]
    fn tax_is_non_decreasing_in_amount() {
        let brackets = french_brackets();
        let mut amounts = sample_amounts();
        amounts.sort();

        let taxes: Vec<_> = amounts
            .iter()
            .map(|a| compute_bracket_tax(*a, &brackets))
            .collect();

        for pair in taxes.windows(2) {
            assert!(pair[1] >= pair[0], "{} < {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn tax_is_continuous_across_each_boundary() {
        let brackets = french_brackets();
        let epsilon = dec!(0.0001);

        for b in brackets.iter().filter_map(|b| b.upper_bound) {
            let below = compute_bracket_tax(b - epsilon, &brackets);
            let at = compute_bracket_tax(b, &brackets);
            let above = compute_bracket_tax(b + epsilon, &brackets);

            // The jump over epsilon is bounded by the top marginal rate.
            assert!(at - below <= epsilon, "jump below boundary {b}");
            assert!(above - at <= epsilon, "jump above boundary {b}");
        }
    }

    #[test]
    fn boundary_amount_taxes_only_lower_bands() {
        let brackets = french_brackets();

        let tax = compute_bracket_tax(dec!(28797), &brackets);

        assert_eq!(tax, dec!(0.11) * dec!(17503));
    }

    // =========================================================================
    // marginal_rate tests
    // =========================================================================

    #[test]
    fn marginal_rate_at_boundary_is_lower_band() {
        assert_eq!(
            marginal_rate(dec!(28797), &french_brackets()),
            Percent::new(dec!(11))
        );
    }

    #[test]
    fn marginal_rate_above_boundary_is_upper_band() {
        assert_eq!(
            marginal_rate(dec!(28797.01), &french_brackets()),
            Percent::new(dec!(30))
        );
    }

    #[test]
    fn marginal_rate_in_top_band() {
        assert_eq!(
            marginal_rate(dec!(1000000), &french_brackets()),
            Percent::new(dec!(45))
        );
    }

    #[test]
    fn marginal_rate_of_zero_is_first_band() {
        assert_eq!(marginal_rate(dec!(0), &french_brackets()), Percent::ZERO);
    }

    // =========================================================================
    // compute_marginal_bracket_tax tests
    // =========================================================================

    #[test]
    fn marginal_bracket_tax_stacks_on_existing_amount() {
        let brackets = vec![
            bracket(dec!(0), Some(dec!(37700)), dec!(18)),
            bracket(dec!(37700), None, dec!(24)),
        ];

        let tax = compute_marginal_bracket_tax(dec!(10000), dec!(32700), &brackets);

        // 5,000 at 18% and 5,000 at 24%
        assert_eq!(tax, dec!(2100));
    }

    #[test]
    fn largest_accepted_amount_stays_in_range() {
        let tax = compute_bracket_tax(MAX_AMOUNT, &french_brackets());

        assert!(tax > Decimal::ZERO);
        assert!(tax < MAX_AMOUNT);
    }
}
