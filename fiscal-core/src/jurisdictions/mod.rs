//! Calculators for each supported jurisdiction.
//!
//! Every calculator follows the same shape: a config read from
//! [`YearTables`](crate::models::YearTables) with `from_year_tables`, an input
//! struct with `validate`, and a `calculate` method returning a
//! [`CalculationResult`](crate::models::CalculationResult) (wrapped in a
//! detail struct when the calculation has more to report).

pub mod france;
pub mod germany;
pub mod italy;
pub mod uk;
pub mod vat;

pub use vat::{VatCalculator, VatConfig, VatInput, VatRateSelection, VatResult};
