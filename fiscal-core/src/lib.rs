//! Tax-computation primitives and the jurisdiction calculators built on them.
//!
//! - [`calculations`]: bracket engine, allowance resolver, flat-rate
//!   transformer, multiplier composition
//! - [`models`]: brackets, allowances, holdings, results, year tables
//! - [`jurisdictions`]: France, Germany, Italy, United Kingdom and VAT
//! - [`input`]: defaults and checks for form inputs

pub mod calculations;
pub mod input;
pub mod jurisdictions;
pub mod models;

pub use calculations::CalculationError;
pub use models::*;
