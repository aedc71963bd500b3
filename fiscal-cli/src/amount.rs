//! Parsing of money amounts and percentages typed on the command line.
//!
//! Accepted shapes: `1234.56`, `1,234.56`, `1.234,56`, `1 234,56`, each with
//! an optional currency symbol or code (`€`, `£`, `$`, `EUR`, `GBP`, `USD`)
//! before or after the number.
//!
//! With both `.` and `,` present the last one is the decimal separator. A
//! single separator is read as a thousands separator when it repeats
//! (`1,234,567`) or when it is followed by exactly three digits and preceded
//! by one to three digits not starting with zero (`1.234`). Otherwise it is
//! the decimal separator (`12,5`, `0,125`, `1234.567`).

use std::str::FromStr;
use std::sync::OnceLock;

use fiscal_core::Percent;
use fiscal_core::input::{MAX_AMOUNT, MAX_PERCENT};
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// Error returned when a string cannot be read as an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount '{input}': {reason}")]
pub struct ParseAmountError {
    input: String,
    reason: String,
}

impl ParseAmountError {
    fn new(
        input: &str,
        reason: impl Into<String>,
    ) -> Self {
        let err = Self {
            input: input.to_string(),
            reason: reason.into(),
        };
        debug!(input, reason = %err.reason, "rejected amount");
        err
    }
}

fn currency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:€|£|\$|EUR|GBP|USD)?\s*(?P<number>.*?)\s*(?:€|£|\$|EUR|GBP|USD)?\s*$")
            .expect("currency pattern is a valid regex")
    })
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?[0-9]+(?:[.,][0-9]+)*$")
            .expect("number pattern is a valid regex")
    })
}

/// Parses an amount. Empty or whitespace-only input is `None`.
///
/// Amounts whose magnitude exceeds [`MAX_AMOUNT`] are rejected.
pub fn parse_amount(s: &str) -> Result<Option<Decimal>, ParseAmountError> {
    if s.trim().is_empty() {
        return Ok(None);
    }

    let number = currency_pattern()
        .captures(s)
        .and_then(|caps| caps.name("number"))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let compact: String = number.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ParseAmountError::new(s, "no digits"));
    }
    if !number_pattern().is_match(&compact) {
        return Err(ParseAmountError::new(s, "not a number"));
    }

    let normalized =
        normalize_separators(&compact).map_err(|reason| ParseAmountError::new(s, reason))?;
    let value =
        Decimal::from_str(&normalized).map_err(|e| ParseAmountError::new(s, e.to_string()))?;
    if value.abs() > MAX_AMOUNT {
        return Err(ParseAmountError::new(
            s,
            format!("must not exceed {MAX_AMOUNT} in magnitude"),
        ));
    }
    Ok(Some(value))
}

/// Rewrites `compact` (digits, sign and separators only) with `.` as the
/// only separator.
fn normalize_separators(compact: &str) -> Result<String, &'static str> {
    let sign = if compact.starts_with('-') { "-" } else { "" };
    let digits = compact.strip_prefix(['+', '-']).unwrap_or(compact);

    let decimal_separator = match (digits.rfind('.'), digits.rfind(',')) {
        (None, None) => return Ok(format!("{sign}{digits}")),
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => single_separator_role(digits, '.'),
        (None, Some(_)) => single_separator_role(digits, ','),
    };

    let (integer, fraction) = match decimal_separator {
        Some(sep) => {
            if digits.matches(sep).count() > 1 {
                return Err("decimal separator appears more than once");
            }
            digits.split_once(sep).unwrap_or((digits, ""))
        }
        None => (digits, ""),
    };

    let groups: Vec<&str> = integer.split(['.', ',']).collect();
    if groups.len() > 1 && groups[1..].iter().any(|g| g.len() != 3) {
        return Err("thousands groups must have three digits");
    }

    let mut normalized = format!("{sign}{}", groups.concat());
    if decimal_separator.is_some() {
        normalized.push('.');
        normalized.push_str(fraction);
    }
    Ok(normalized)
}

/// `Some(sep)` when the only separator kind present is a decimal separator,
/// `None` when it groups thousands.
fn single_separator_role(
    digits: &str,
    sep: char,
) -> Option<char> {
    if digits.matches(sep).count() > 1 {
        return None;
    }
    let (integer, fraction) = digits.split_once(sep)?;
    let looks_grouped = fraction.len() == 3
        && (1..=3).contains(&integer.len())
        && !integer.starts_with('0');
    if looks_grouped { None } else { Some(sep) }
}

/// Clap value parser for a required amount.
pub fn amount_arg(s: &str) -> Result<Decimal, ParseAmountError> {
    parse_amount(s)?.ok_or_else(|| ParseAmountError::new(s, "an amount is required"))
}

/// Clap value parser for a percentage: `9`, `9%`, `5,5` or `5.5 %`.
///
/// Values whose magnitude exceeds [`MAX_PERCENT`] are rejected.
pub fn percent_arg(s: &str) -> Result<Percent, ParseAmountError> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    let value = parse_amount(number)?
        .ok_or_else(|| ParseAmountError::new(s, "a percentage is required"))?;
    if value.abs() > MAX_PERCENT {
        return Err(ParseAmountError::new(
            s,
            format!("must not exceed {MAX_PERCENT}%"),
        ));
    }
    Ok(Percent::new(value))
}

/// Parses an optional amount held as text, naming the flag in the error.
pub fn optional_amount(
    value: Option<&str>,
    flag: &str,
) -> anyhow::Result<Option<Decimal>> {
    use anyhow::Context;

    match value {
        Some(text) => parse_amount(text).with_context(|| format!("--{flag}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn amount(s: &str) -> Decimal {
        parse_amount(s)
            .unwrap_or_else(|e| panic!("'{s}' should parse: {e}"))
            .unwrap_or_else(|| panic!("'{s}' should not be empty"))
    }

    // ==================== plain numbers ====================

    #[test]
    fn plain_decimal() {
        assert_eq!(amount("1234.56"), dec!(1234.56));
        assert_eq!(amount("  123.45  "), dec!(123.45));
        assert_eq!(amount("1000"), dec!(1000));
    }

    #[test]
    fn signed_amounts() {
        assert_eq!(amount("-2500"), dec!(-2500));
        assert_eq!(amount("+1,5"), dec!(1.5));
    }

    #[test]
    fn empty_input_is_absent() {
        assert_eq!(parse_amount(""), Ok(None));
        assert_eq!(parse_amount("   "), Ok(None));
    }

    // ==================== separators ====================

    #[test]
    fn english_grouping() {
        assert_eq!(amount("1,234.56"), dec!(1234.56));
        assert_eq!(amount("1,234,567.89"), dec!(1234567.89));
    }

    #[test]
    fn continental_grouping() {
        assert_eq!(amount("1.234,56"), dec!(1234.56));
        assert_eq!(amount("1.234.567"), dec!(1234567));
    }

    #[test]
    fn space_grouping() {
        assert_eq!(amount("1 234,56"), dec!(1234.56));
        assert_eq!(amount("1\u{a0}234\u{a0}567"), dec!(1234567));
    }

    #[test]
    fn single_separator_with_three_digits_groups_thousands() {
        assert_eq!(amount("1.234"), dec!(1234));
        assert_eq!(amount("250,000"), dec!(250000));
    }

    #[test]
    fn single_separator_otherwise_is_decimal() {
        assert_eq!(amount("12,5"), dec!(12.5));
        assert_eq!(amount("0,125"), dec!(0.125));
        assert_eq!(amount("1234.567"), dec!(1234.567));
    }

    // ==================== currency ====================

    #[test]
    fn currency_before_or_after() {
        assert_eq!(amount("€1.234,56"), dec!(1234.56));
        assert_eq!(amount("1 234,56 €"), dec!(1234.56));
        assert_eq!(amount("£300,000"), dec!(300000));
        assert_eq!(amount("EUR 1000"), dec!(1000));
        assert_eq!(amount("2500 gbp"), dec!(2500));
        assert_eq!(amount("$19.99"), dec!(19.99));
    }

    // ==================== rejection ====================

    #[test]
    fn rejects_text() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12abc").is_err());
        assert!(parse_amount("€").is_err());
    }

    #[test]
    fn rejects_repeated_decimal_separator() {
        assert!(parse_amount("1.234,56,7").is_err());
    }

    #[test]
    fn rejects_short_thousands_group() {
        assert!(parse_amount("1,23,456").is_err());
        assert!(parse_amount("1.23.456,00").is_err());
    }

    #[test]
    fn rejects_amounts_beyond_limit() {
        let err = parse_amount("79228162514264337593543950335").unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid amount '79228162514264337593543950335': \
             must not exceed 1000000000000000 in magnitude"
        );
        assert!(parse_amount("-1000000000000000.01").is_err());
        assert_eq!(amount("1000000000000000"), MAX_AMOUNT);
    }

    #[test]
    fn error_message_names_the_input() {
        let err = parse_amount("12x").unwrap_err();

        assert_eq!(err.to_string(), "invalid amount '12x': not a number");
    }

    // ==================== clap parsers ====================

    #[test]
    fn amount_arg_requires_a_value() {
        assert_eq!(amount_arg("1.000,50"), Ok(dec!(1000.50)));
        assert!(amount_arg("").is_err());
        assert!(amount_arg("79228162514264337593543950335").is_err());
    }

    #[test]
    fn percent_arg_accepts_sign_and_comma() {
        assert_eq!(percent_arg("9"), Ok(Percent::new(dec!(9))));
        assert_eq!(percent_arg("9%"), Ok(Percent::new(dec!(9))));
        assert_eq!(percent_arg("5,5 %"), Ok(Percent::new(dec!(5.5))));
        assert_eq!(percent_arg("0,031"), Ok(Percent::new(dec!(0.031))));
        assert!(percent_arg("%").is_err());
    }

    #[test]
    fn percent_arg_rejects_values_beyond_limit() {
        assert_eq!(percent_arg("1000000%"), Ok(Percent::new(MAX_PERCENT)));
        assert!(percent_arg("1000001").is_err());
        assert!(percent_arg("79228162514264337593543950335").is_err());
    }

    #[test]
    fn optional_amount_names_the_flag() {
        assert_eq!(optional_amount(None, "works").unwrap(), None);
        assert_eq!(optional_amount(Some(""), "works").unwrap(), None);
        assert_eq!(optional_amount(Some("15 000"), "works").unwrap(), Some(dec!(15000)));

        let err = optional_amount(Some("lots"), "works").unwrap_err();
        assert_eq!(format!("{err:#}"), "--works: invalid amount 'lots': not a number");
    }
}
