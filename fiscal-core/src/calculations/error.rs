use thiserror::Error;

use crate::models::BracketTableError;

/// Errors raised by calculators and table lookups.
///
/// The arithmetic primitives never fail; these errors come from input
/// validation at the boundary and from configuration lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    /// A caller-supplied value is outside what the calculation accepts.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// A category was not found in a lookup table.
    #[error("'{category}' is not a known entry of {table}")]
    OutOfDomain { table: String, category: String },

    /// The rate tables for the jurisdiction lack an entry a calculator needs.
    #[error("rate tables have no '{name}' entry")]
    MissingTable { name: String },

    /// A bracket schedule in the rate tables is malformed.
    #[error("bracket table '{name}' is invalid: {source}")]
    InvalidTable {
        name: String,
        #[source]
        source: BracketTableError,
    },
}

impl CalculationError {
    pub fn invalid(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn out_of_domain(
        table: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self::OutOfDomain {
            table: table.into(),
            category: category.into(),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingTable { name: name.into() }
    }
}
