//! The four pure computation primitives every calculator is built from.
//!
//! | Primitive | Entry point |
//! |-----------|-------------|
//! | Bracket tax engine | [`compute_bracket_tax`] |
//! | Allowance/exemption resolver | [`resolve_allowance`] |
//! | Flat-rate transformer | [`apply_flat_rate`] |
//! | Multiplier composition | [`compose_multiplier_tax`] |
//!
//! None of them can fail. They stay within the range of `Decimal` for
//! amounts up to [`MAX_AMOUNT`](crate::input::MAX_AMOUNT) and rates up to
//! [`MAX_PERCENT`](crate::input::MAX_PERCENT); calculator inputs are checked
//! against those limits before the primitives run.

pub mod allowance;
pub mod bracket;
pub mod common;
pub mod error;
pub mod flat_rate;
pub mod multiplier;

pub use allowance::resolve_allowance;
pub use bracket::{compute_bracket_tax, compute_marginal_bracket_tax, marginal_rate};
pub use error::CalculationError;
pub use flat_rate::{Direction, FlatRateBreakdown, FlatRateSpec, apply_flat_rate};
pub use multiplier::{MultiplierSpec, compose_multiplier_tax};
