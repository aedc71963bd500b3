//! Input-boundary helpers.
//!
//! Form fields that may be left empty are `Option<Decimal>`. Calculators
//! resolve them through these helpers so every default is explicit at the
//! call site and shows up in the debug log. Checks for negative or
//! out-of-range values also live here, keeping the arithmetic total.
//!
//! Amounts are capped at [`MAX_AMOUNT`] and rates at [`MAX_PERCENT`]. Within
//! those limits no product of an amount and two rates can leave the range of
//! `Decimal`.

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::CalculationError;
use crate::models::Percent;

/// Largest amount a calculator accepts: one quadrillion (10^15).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Largest rate or multiplier accepted, in percent (10^6%).
pub const MAX_PERCENT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Resolves an optional amount, substituting zero when absent.
pub fn or_zero(
    value: Option<Decimal>,
    field: &'static str,
) -> Decimal {
    or_default(value, field, Decimal::ZERO)
}

/// Resolves an optional amount, substituting `default` when absent.
pub fn or_default(
    value: Option<Decimal>,
    field: &'static str,
    default: Decimal,
) -> Decimal {
    value.unwrap_or_else(|| {
        debug!(field, %default, "field left empty; using default");
        default
    })
}

/// Resolves an optional percentage, substituting `default` when absent.
pub fn percent_or(
    value: Option<Percent>,
    field: &'static str,
    default: Percent,
) -> Percent {
    value.unwrap_or_else(|| {
        debug!(field, %default, "field left empty; using default");
        default
    })
}

/// Rejects amounts whose magnitude exceeds [`MAX_AMOUNT`]. Negative values
/// (losses) are allowed.
///
/// # Arguments
///
/// * `value` - the amount as entered
/// * `field` - input field name reported in the error
///
/// # Returns
///
/// `Ok(())`, or [`CalculationError::InvalidInput`] for `field`.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use fiscal_core::input::require_within_limit;
///
/// assert!(require_within_limit(dec!(-25000), "gain").is_ok());
/// assert!(require_within_limit(Decimal::MAX, "gain").is_err());
/// ```
pub fn require_within_limit(
    value: Decimal,
    field: &'static str,
) -> Result<(), CalculationError> {
    if value.abs() > MAX_AMOUNT {
        return Err(CalculationError::invalid(
            field,
            format!("must not exceed {MAX_AMOUNT} in magnitude, got {value}"),
        ));
    }
    Ok(())
}

/// Rejects negative amounts and amounts above [`MAX_AMOUNT`].
pub fn require_non_negative(
    value: Decimal,
    field: &'static str,
) -> Result<(), CalculationError> {
    if value < Decimal::ZERO {
        return Err(CalculationError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    require_within_limit(value, field)
}

/// Rejects a negative amount when one is present.
pub fn require_non_negative_opt(
    value: Option<Decimal>,
    field: &'static str,
) -> Result<(), CalculationError> {
    value.map_or(Ok(()), |v| require_non_negative(v, field))
}

/// Rejects negative rates and rates above [`MAX_PERCENT`].
pub fn require_rate(
    value: Percent,
    field: &'static str,
) -> Result<(), CalculationError> {
    if value.is_negative() {
        return Err(CalculationError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    if value.value() > MAX_PERCENT {
        return Err(CalculationError::invalid(
            field,
            format!("must not exceed {MAX_PERCENT}%, got {value}"),
        ));
    }
    Ok(())
}

/// Rejects percentages outside `0..=100`.
pub fn require_percent_range(
    value: Percent,
    field: &'static str,
) -> Result<(), CalculationError> {
    if value.is_negative() || value > Percent::HUNDRED {
        return Err(CalculationError::invalid(
            field,
            format!("must be between 0% and 100%, got {value}"),
        ));
    }
    Ok(())
}
