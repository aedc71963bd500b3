use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A percentage value, stored as written (`20` means 20%).
///
/// Tax tables quote rates as percentages, so the tables, the calculators and
/// the command line all use this unit. Call [`Percent::as_fraction`] when the
/// value has to be multiplied into an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(Decimal);

impl Percent {
    pub const ZERO: Percent = Percent(Decimal::ZERO);
    pub const HUNDRED: Percent = Percent(Decimal::ONE_HUNDRED);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The percentage as written, e.g. `20` for 20%.
    pub fn value(self) -> Decimal {
        self.0
    }

    /// The percentage as a multiplier, e.g. `0.20` for 20%.
    pub fn as_fraction(self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Applies the percentage to `amount` without rounding.
    pub fn of(
        self,
        amount: Decimal,
    ) -> Decimal {
        amount * self.as_fraction()
    }

    /// Builds a percentage from a ratio such as `tax / gross`.
    pub fn from_fraction(fraction: Decimal) -> Self {
        Self(fraction * Decimal::ONE_HUNDRED)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl From<Decimal> for Percent {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Percent {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}
