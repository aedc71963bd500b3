//! Rounding and clamping helpers shared by the primitives and calculators.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, halves away from zero.
///
/// # Arguments
///
/// * `value` - The amount to round
///
/// # Returns
///
/// The amount rounded to two decimal places.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(343.745)), dec!(343.75));
/// assert_eq!(round_half_up(dec!(-343.745)), dec!(-343.75));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds down to a whole multiple of `step` (e.g. whole euros, whole hundreds).
///
/// Statutes that say "rounded down to full euros" apply to positive amounts;
/// negative inputs are rounded toward negative infinity as well.
///
/// # Arguments
///
/// * `value` - The amount to round
/// * `step` - The unit to round to; zero or negative returns `value` unchanged
///
/// # Returns
///
/// The largest multiple of `step` not above `value`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::common::round_down_to;
///
/// assert_eq!(round_down_to(dec!(75599.99), dec!(100)), dec!(75500));
/// assert_eq!(round_down_to(dec!(1234.56), dec!(1)), dec!(1234));
/// ```
pub fn round_down_to(
    value: Decimal,
    step: Decimal,
) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).floor() * step
}

/// Returns the larger of two values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Clamps negative values to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(17149.994)), dec!(17149.99));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(166.665)), dec!(166.67));
    }

    #[test]
    fn round_half_up_goes_away_from_zero_for_negatives() {
        assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn round_half_up_preserves_cents() {
        assert_eq!(round_half_up(dec!(1200.00)), dec!(1200.00));
    }

    // =========================================================================
    // round_down_to tests
    // =========================================================================

    #[test]
    fn round_down_to_whole_hundreds() {
        assert_eq!(round_down_to(dec!(100099), dec!(100)), dec!(100000));
    }

    #[test]
    fn round_down_to_keeps_exact_multiples() {
        assert_eq!(round_down_to(dec!(24500), dec!(100)), dec!(24500));
    }

    #[test]
    fn round_down_to_ignores_non_positive_step() {
        assert_eq!(round_down_to(dec!(12.34), dec!(0)), dec!(12.34));
    }

    // =========================================================================
    // max / non_negative tests
    // =========================================================================

    #[test]
    fn max_returns_larger_value() {
        assert_eq!(max(dec!(-50.00), dec!(50.00)), dec!(50.00));
        assert_eq!(max(dec!(200.00), dec!(100.00)), dec!(200.00));
    }

    #[test]
    fn non_negative_clamps_losses() {
        assert_eq!(non_negative(dec!(-1500)), dec!(0));
        assert_eq!(non_negative(dec!(1500)), dec!(1500));
    }
}
