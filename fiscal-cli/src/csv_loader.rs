//! CSV loader for batch VAT calculations.
//!
//! ## CSV Format
//!
//! Column order does **not** matter (headers are matched by name). Header
//! names are case-sensitive and must match exactly.
//!
//! | Column      | Required | Notes                                                   |
//! |-------------|----------|---------------------------------------------------------|
//! | `country`   | yes      | `FR`, `DE`, `IT` or `UK` (`GB` and lowercase accepted)  |
//! | `amount`    | yes      | Net amount to add VAT to, or gross amount to remove it from. Quote amounts with a comma |
//! | `rate_kind` | yes      | `standard`, `reduced`, ... from the country's VAT table |
//! | `direction` | yes      | `add` (or `net`) / `remove` (or `gross`)                |
//! | `rate`      | no       | Explicit percentage; overrides `rate_kind` when present |
//!
//! `rate_kind` may be left empty on rows that give a `rate`.
//!
//! ### Example
//!
//! ```csv
//! country,amount,rate_kind,direction,rate
//! FR,1000,standard,add,
//! DE,"1.190,00",standard,remove,
//! IT,250,,add,22
//! ```

use std::path::{Path, PathBuf};

use fiscal_core::Country;
use fiscal_core::calculations::Direction;
use fiscal_core::jurisdictions::{VatInput, VatRateSelection};
use serde::Deserialize;

use crate::amount::{ParseAmountError, amount_arg, percent_arg};

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout exactly
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    country: String,
    amount: String,
    rate_kind: Option<String>,
    direction: String,
    #[serde(default)]
    rate: Option<String>,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One VAT calculation requested by a CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VatLine {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub country: Country,
    pub input: VatInput,
}

/// Errors that can occur while loading or converting CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// The underlying CSV deserialisation failed (bad structure, missing
    /// required column, etc.).
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognised country '{value}' on row {row}")]
    InvalidCountry { value: String, row: usize },

    #[error("row {row}: {source}")]
    InvalidAmount {
        row: usize,
        #[source]
        source: ParseAmountError,
    },

    #[error("unrecognised direction '{value}' on row {row} (expected add or remove)")]
    InvalidDirection { value: String, row: usize },

    /// Neither `rate_kind` nor `rate` was filled in.
    #[error("row {row} has neither a rate kind nor a rate")]
    MissingRate { row: usize },
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

/// Convert a single CSV row into a [`VatLine`].
///
/// `row_number` is 1-based (for error messages).
fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<VatLine, CsvLoadError> {
    let country = Country::parse(&row.country).ok_or_else(|| CsvLoadError::InvalidCountry {
        value: row.country.clone(),
        row: row_number,
    })?;

    let amount = amount_arg(&row.amount).map_err(|source| CsvLoadError::InvalidAmount {
        row: row_number,
        source,
    })?;

    let direction = Direction::parse(&row.direction).ok_or_else(|| {
        CsvLoadError::InvalidDirection {
            value: row.direction.clone(),
            row: row_number,
        }
    })?;

    let explicit_rate = row.rate.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let rate_kind = row.rate_kind.as_deref().map(str::trim).filter(|k| !k.is_empty());
    let rate = match (explicit_rate, rate_kind) {
        (Some(rate), _) => VatRateSelection::Explicit(percent_arg(rate).map_err(|source| {
            CsvLoadError::InvalidAmount {
                row: row_number,
                source,
            }
        })?),
        (None, Some(kind)) => VatRateSelection::Kind(kind.to_ascii_lowercase()),
        (None, None) => return Err(CsvLoadError::MissingRate { row: row_number }),
    };

    Ok(VatLine {
        row: row_number,
        country,
        input: VatInput {
            amount,
            rate,
            direction,
        },
    })
}

/// Parse CSV text and return the requested calculations in file order.
///
/// # Errors
///
/// * [`CsvLoadError::Parse`] if the CSV is structurally invalid or a required
///   column is missing.
/// * The row-level variants for the first row with an unreadable value.
pub fn load_from_str(input: &str) -> Result<Vec<VatLine>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All) // tolerate whitespace around values
        .flexible(false) // strict column count
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Reads a file from disk and delegates to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<VatLine>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
