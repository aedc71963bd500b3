use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Percent;

/// One band of a progressive schedule.
///
/// `upper_bound` of `None` marks the open-ended top band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Percent,
}

impl TaxBracket {
    pub fn new(
        lower_bound: Decimal,
        upper_bound: Option<Decimal>,
        rate: Percent,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }

    /// Width of the band, `None` for the unbounded top band.
    pub fn width(&self) -> Option<Decimal> {
        self.upper_bound.map(|upper| upper - self.lower_bound)
    }

    /// Whether `amount` falls in this band. Boundaries belong to the lower band.
    pub fn contains(
        &self,
        amount: Decimal,
    ) -> bool {
        amount > self.lower_bound && self.upper_bound.is_none_or(|upper| amount <= upper)
    }
}

/// Structural problems in a bracket schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table is empty")]
    Empty,

    #[error("first bracket must start at zero, starts at {0}")]
    FirstBracketNotAtZero(Decimal),

    #[error("bracket {index} starts at {lower_bound} but previous bracket ends at {previous_upper}")]
    NotContiguous {
        index: usize,
        lower_bound: Decimal,
        previous_upper: Decimal,
    },

    #[error("bracket {index} has upper bound {upper_bound} not above its lower bound {lower_bound}")]
    EmptyRange {
        index: usize,
        lower_bound: Decimal,
        upper_bound: Decimal,
    },

    #[error("bracket {0} is unbounded but is not the last bracket")]
    UnboundedBeforeEnd(usize),

    #[error("last bracket must be unbounded")]
    LastBracketBounded,

    #[error("bracket {index} has negative rate {rate}")]
    NegativeRate { index: usize, rate: Percent },
}

/// An ordered, validated progressive schedule.
///
/// Deserializes from a plain list of brackets; call [`BracketTable::validate`]
/// (or build through [`BracketTable::new`]) before trusting the ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    /// Builds a table and checks its invariants.
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, BracketTableError> {
        let table = Self { brackets };
        table.validate()?;
        Ok(table)
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Returns a copy of the schedule with `extra` added to every band's rate.
    ///
    /// Used for surcharges that raise every band by the same amount.
    pub fn with_rate_surcharge(
        &self,
        extra: Percent,
    ) -> Self {
        Self {
            brackets: self
                .brackets
                .iter()
                .map(|b| TaxBracket {
                    rate: Percent::new(b.rate.value() + extra.value()),
                    ..b.clone()
                })
                .collect(),
        }
    }

    /// Checks that brackets start at zero, are ascending and contiguous, and
    /// that only the last one is unbounded.
    ///
    /// # Errors
    ///
    /// Returns the first [`BracketTableError`] found, scanning from the lowest band.
    pub fn validate(&self) -> Result<(), BracketTableError> {
        let first = self.brackets.first().ok_or(BracketTableError::Empty)?;
        if !first.lower_bound.is_zero() {
            return Err(BracketTableError::FirstBracketNotAtZero(first.lower_bound));
        }

        let last_index = self.brackets.len() - 1;
        let mut previous_upper: Option<Decimal> = None;

        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate.is_negative() {
                return Err(BracketTableError::NegativeRate {
                    index,
                    rate: bracket.rate,
                });
            }

            if let Some(previous_upper) = previous_upper {
                if bracket.lower_bound != previous_upper {
                    return Err(BracketTableError::NotContiguous {
                        index,
                        lower_bound: bracket.lower_bound,
                        previous_upper,
                    });
                }
            }

            match bracket.upper_bound {
                Some(upper_bound) if upper_bound <= bracket.lower_bound => {
                    return Err(BracketTableError::EmptyRange {
                        index,
                        lower_bound: bracket.lower_bound,
                        upper_bound,
                    });
                }
                Some(_) if index == last_index => {
                    return Err(BracketTableError::LastBracketBounded);
                }
                None if index != last_index => {
                    return Err(BracketTableError::UnboundedBeforeEnd(index));
                }
                _ => {}
            }

            previous_upper = bracket.upper_bound;
        }

        Ok(())
    }
}

impl AsRef<[TaxBracket]> for BracketTable {
    fn as_ref(&self) -> &[TaxBracket] {
        &self.brackets
    }
}
