//! Rendering of calculation results as text or JSON.

use std::fmt::{self, Display};

use clap::ValueEnum;
use fiscal_core::calculations::common::round_half_up;
use fiscal_core::{CalculationResult, JurisdictionKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One calculation, ready to print.
#[derive(Debug, Clone)]
pub struct Report {
    title: String,
    key: Option<JurisdictionKey>,
    details: Vec<(String, String)>,
    result: Option<CalculationResult>,
    payload: Value,
}

impl Report {
    /// `payload` is what the JSON output carries under `assessment`.
    pub fn new<T: Serialize>(
        title: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            title: title.into(),
            key: None,
            details: Vec::new(),
            result: None,
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn jurisdiction(
        mut self,
        key: JurisdictionKey,
    ) -> Self {
        self.key = Some(key);
        self
    }

    pub fn detail(
        mut self,
        label: impl Into<String>,
        value: impl Display,
    ) -> Self {
        self.details.push((label.into(), value.to_string()));
        self
    }

    /// Adds an amount in the jurisdiction's currency.
    pub fn amount(
        self,
        label: impl Into<String>,
        value: Decimal,
    ) -> Self {
        let formatted = money(value, self.currency());
        self.detail(label, formatted)
    }

    pub fn result(
        mut self,
        result: &CalculationResult,
    ) -> Self {
        self.result = Some(result.clone());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn currency(&self) -> Option<&'static str> {
        self.key.map(|key| key.country.currency())
    }

    pub fn to_json(&self) -> Value {
        json!({
            "calculation": self.title,
            "jurisdiction": self.key,
            "currency": self.currency(),
            "assessment": self.payload,
        })
    }

    fn rows(&self) -> Vec<(String, String)> {
        let mut rows = self.details.clone();
        if let Some(result) = &self.result {
            let currency = self.currency();
            if result.exempt {
                rows.push(("exempt".to_string(), "yes".to_string()));
            }
            rows.extend(
                result
                    .components
                    .iter()
                    .map(|c| (c.kind.label().to_string(), money(c.amount, currency))),
            );
            rows.push(("total tax".to_string(), money(result.total_tax, currency)));
            rows.push(("net amount".to_string(), money(result.net_amount, currency)));
            rows.push(("effective rate".to_string(), result.effective_rate.to_string()));
        }
        rows
    }
}

impl Display for Report {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.key {
            Some(key) => writeln!(f, "{} ({key})", self.title)?,
            None => writeln!(f, "{}", self.title)?,
        }

        let rows = self.rows();
        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|(_, value)| value.chars().count()).max().unwrap_or(0);
        for (label, value) in &rows {
            writeln!(f, "  {label:<label_width$}  {value:>value_width$}")?;
        }
        Ok(())
    }
}

/// Renders a single report.
pub fn render(
    report: &Report,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(&report.to_json()),
    }
}

/// Renders several reports: blank-line separated text or a JSON array.
pub fn render_all(
    reports: &[Report],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(reports
            .iter()
            .map(Report::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&reports.iter().map(Report::to_json).collect::<Vec<_>>())
        }
    }
}

/// Formats `amount` to cents with thousands separators, e.g. `12,345.60 EUR`.
pub fn money(
    amount: Decimal,
    currency: Option<&str>,
) -> String {
    let rounded = format!("{:.2}", round_half_up(amount));
    let (sign, unsigned) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (integer, cents) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match currency {
        Some(code) => format!("{sign}{grouped}.{cents} {code}"),
        None => format!("{sign}{grouped}.{cents}"),
    }
}

#[cfg(test)]
mod tests {
    use fiscal_core::{Country, TaxComponent, TaxComponentKind};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn stamp_duty_report() -> Report {
        let result = CalculationResult::new(
            dec!(300000),
            dec!(300000),
            vec![TaxComponent::new(TaxComponentKind::StampDuty, dec!(5000))],
        );
        Report::new("UK stamp duty", &result)
            .unwrap()
            .jurisdiction(JurisdictionKey::new(Country::UnitedKingdom, 2025))
            .detail("first-time buyer relief", "no")
            .result(&result)
    }

    // ==================== money ====================

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(dec!(1234567.891), Some("EUR")), "1,234,567.89 EUR");
        assert_eq!(money(dec!(999), None), "999.00");
        assert_eq!(money(dec!(1000), None), "1,000.00");
    }

    #[test]
    fn money_rounds_half_up() {
        assert_eq!(money(dec!(343.745), None), "343.75");
        assert_eq!(money(dec!(0.004), None), "0.00");
    }

    #[test]
    fn money_keeps_the_sign() {
        assert_eq!(money(dec!(-2500.5), Some("GBP")), "-2,500.50 GBP");
    }

    // ==================== text ====================

    #[test]
    fn text_lists_details_components_and_totals() {
        let text = render(&stamp_duty_report(), OutputFormat::Text).unwrap();

        assert_eq!(
            text,
            "UK stamp duty (UK 2025)\n\
             \x20 first-time buyer relief              no\n\
             \x20 stamp duty                 5,000.00 GBP\n\
             \x20 total tax                  5,000.00 GBP\n\
             \x20 net amount               295,000.00 GBP\n\
             \x20 effective rate                  1.6667%\n"
        );
    }

    #[test]
    fn text_without_jurisdiction_has_plain_title() {
        let report = Report::new("multiplier", &dec!(17150))
            .unwrap()
            .amount("tax", dec!(17150));

        assert_eq!(report.to_string(), "multiplier\n  tax  17,150.00\n");
    }

    // ==================== json ====================

    #[test]
    fn json_wraps_the_assessment() {
        let json: Value =
            serde_json::from_str(&render(&stamp_duty_report(), OutputFormat::Json).unwrap())
                .unwrap();

        assert_eq!(json["calculation"], "UK stamp duty");
        assert_eq!(json["jurisdiction"]["country"], "UK");
        assert_eq!(json["jurisdiction"]["tax_year"], 2025);
        assert_eq!(json["currency"], "GBP");
        assert_eq!(json["assessment"]["total_tax"], "5000");
    }

    #[test]
    fn json_batch_is_an_array() {
        let reports = vec![stamp_duty_report(), stamp_duty_report()];

        let json: Value =
            serde_json::from_str(&render_all(&reports, OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn format_reads_from_settings() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: OutputFormat,
        }

        let parsed: Wrapper = toml::from_str("format = \"json\"").unwrap();

        assert_eq!(parsed.format, OutputFormat::Json);
    }
}
