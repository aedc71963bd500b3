//! Versioned, jurisdiction-keyed rate tables for `fiscal-core` calculators.
//!
//! [`TableRegistry::bundled`] ships the tables for France, Germany, Italy and
//! the United Kingdom; [`TableRegistry::from_dir`] reads replacements from
//! disk, and [`BracketLoader`] turns a CSV file into bracket schedules that
//! [`TableRegistry::apply_brackets`] can swap in.

mod loader;
mod tables;

pub use loader::{BracketLoader, BracketLoaderError, BracketRecord, ScheduleSet};
pub use tables::{TableRegistry, TablesError};
