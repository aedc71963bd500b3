//! Base rate × municipal multiplier composition.
//!
//! German trade and property taxes set a national base rate (Messzahl) and let
//! each municipality scale the result with its own multiplier (Hebesatz).
//! Italian IMU composes a cadastral coefficient with a municipal rate in the
//! same way.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use crate::input::require_rate;
use crate::models::Percent;

/// A base rate and the local multiplier applied on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierSpec {
    pub base_rate: Percent,
    pub multiplier: Percent,
}

impl MultiplierSpec {
    pub fn new(
        base_rate: Percent,
        multiplier: Percent,
    ) -> Self {
        Self {
            base_rate,
            multiplier,
        }
    }

    /// Rejects negative rates. Large multipliers are accepted up to
    /// [`MAX_PERCENT`](crate::input::MAX_PERCENT).
    pub fn validate(&self) -> Result<(), CalculationError> {
        require_rate(self.base_rate, "base_rate")?;
        require_rate(self.multiplier, "multiplier")
    }

    /// The effective rate on the base, e.g. 3.5% × 490% = 17.15%.
    pub fn effective_rate(&self) -> Percent {
        Percent::new(self.base_rate.value() * self.multiplier.as_fraction())
    }

    pub fn apply(
        &self,
        base: Decimal,
    ) -> Decimal {
        compose_multiplier_tax(base, self.base_rate, self.multiplier)
    }
}

/// `base × base_rate/100 × multiplier/100`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::Percent;
/// use fiscal_core::calculations::compose_multiplier_tax;
///
/// let tax = compose_multiplier_tax(
///     dec!(100000),
///     Percent::new(dec!(3.5)),
///     Percent::new(dec!(490)),
/// );
/// assert_eq!(tax, dec!(17150));
/// ```
pub fn compose_multiplier_tax(
    base: Decimal,
    base_rate: Percent,
    multiplier: Percent,
) -> Decimal {
    base * base_rate.as_fraction() * multiplier.as_fraction()
}
