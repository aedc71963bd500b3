//! Conversion between tax-exclusive and tax-inclusive amounts at a single rate.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fiscal_core::Percent;
//! use fiscal_core::calculations::{Direction, apply_flat_rate};
//!
//! let added = apply_flat_rate(dec!(1000), Percent::new(dec!(20)), Direction::Add);
//! assert_eq!(added.tax, dec!(200));
//! assert_eq!(added.gross, dec!(1200));
//!
//! let removed = apply_flat_rate(added.gross, Percent::new(dec!(20)), Direction::Remove);
//! assert_eq!(removed.net, dec!(1000));
//! assert_eq!(removed.tax, dec!(200));
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use crate::input::require_rate;
use crate::models::Percent;

/// Whether the input amount excludes (`Add`) or includes (`Remove`) the tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Net in, gross out.
    Add,
    /// Gross in, net out.
    Remove,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "net" => Some(Self::Add),
            "remove" | "gross" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}

/// A rate plus the direction it is applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRateSpec {
    pub rate: Percent,
    pub direction: Direction,
}

impl FlatRateSpec {
    pub fn new(
        rate: Percent,
        direction: Direction,
    ) -> Self {
        Self { rate, direction }
    }

    /// Rejects negative rates and rates above [`MAX_PERCENT`](crate::input::MAX_PERCENT).
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_rate(self.rate, "rate")
    }

    pub fn apply(
        &self,
        amount: Decimal,
    ) -> FlatRateBreakdown {
        apply_flat_rate(amount, self.rate, self.direction)
    }
}

/// Net, tax and gross of one flat-rate conversion. Unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRateBreakdown {
    pub net: Decimal,
    pub tax: Decimal,
    pub gross: Decimal,
}

/// Adds tax to a net amount or removes it from a gross amount.
///
/// - `Add`: `net = amount`, `tax = net × rate`, `gross = net + tax`
/// - `Remove`: `gross = amount`, `net = gross / (1 + rate)`, `tax = gross − net`
///
/// The two directions are inverses of each other. A rate of exactly −100%
/// would divide by zero on removal; the amount is then returned as both net
/// and gross with no tax so the function stays total.
pub fn apply_flat_rate(
    amount: Decimal,
    rate: Percent,
    direction: Direction,
) -> FlatRateBreakdown {
    match direction {
        Direction::Add => {
            let tax = rate.of(amount);
            FlatRateBreakdown {
                net: amount,
                tax,
                gross: amount + tax,
            }
        }
        Direction::Remove => {
            let divisor = Decimal::ONE + rate.as_fraction();
            let net = if divisor.is_zero() {
                amount
            } else {
                amount / divisor
            };
            FlatRateBreakdown {
                net,
                tax: amount - net,
                gross: amount,
            }
        }
    }
}
