use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AllowanceRule, AllowanceTable, BracketTable, Country, JurisdictionKey, Percent};
use crate::calculations::CalculationError;
use crate::jurisdictions::germany::IncomeTariff;

/// Every rate, band and threshold one jurisdiction uses in one tax year.
///
/// Tables are keyed by name so calculators can share the same shape across
/// countries; each calculator's config documents the names it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTables {
    pub country: Country,
    pub tax_year: i32,

    /// VAT rates by kind (`standard`, `reduced`, ...).
    #[serde(default)]
    pub vat: BTreeMap<String, Percent>,

    #[serde(default)]
    pub brackets: BTreeMap<String, BracketTable>,

    /// Allowance lookup tables: table name, then category.
    #[serde(default)]
    pub allowances: BTreeMap<String, BTreeMap<String, AllowanceRule>>,

    #[serde(default)]
    pub rates: BTreeMap<String, Percent>,

    #[serde(default)]
    pub amounts: BTreeMap<String, Decimal>,

    /// Municipal multipliers: schedule (`trade_tax`, `property_tax`), then
    /// lowercase municipality name.
    #[serde(default)]
    pub multipliers: BTreeMap<String, BTreeMap<String, Percent>>,

    /// Plain numeric factors by table, then key (e.g. cadastral coefficients).
    #[serde(default)]
    pub factors: BTreeMap<String, BTreeMap<String, Decimal>>,

    #[serde(default)]
    pub income_tariff: Option<IncomeTariff>,
}

impl YearTables {
    pub fn new(
        country: Country,
        tax_year: i32,
    ) -> Self {
        Self {
            country,
            tax_year,
            vat: BTreeMap::new(),
            brackets: BTreeMap::new(),
            allowances: BTreeMap::new(),
            rates: BTreeMap::new(),
            amounts: BTreeMap::new(),
            multipliers: BTreeMap::new(),
            factors: BTreeMap::new(),
            income_tariff: None,
        }
    }

    pub fn key(&self) -> JurisdictionKey {
        JurisdictionKey::new(self.country, self.tax_year)
    }

    pub fn bracket_table(
        &self,
        name: &str,
    ) -> Result<&BracketTable, CalculationError> {
        self.brackets
            .get(name)
            .ok_or_else(|| CalculationError::missing(format!("brackets.{name}")))
    }

    pub fn rate(
        &self,
        name: &str,
    ) -> Result<Percent, CalculationError> {
        self.rates
            .get(name)
            .copied()
            .ok_or_else(|| CalculationError::missing(format!("rates.{name}")))
    }

    pub fn amount(
        &self,
        name: &str,
    ) -> Result<Decimal, CalculationError> {
        self.amounts
            .get(name)
            .copied()
            .ok_or_else(|| CalculationError::missing(format!("amounts.{name}")))
    }

    pub fn allowance_table(
        &self,
        name: &str,
    ) -> Result<AllowanceTable, CalculationError> {
        self.allowances
            .get(name)
            .map(|rules| AllowanceTable::new(name, rules.clone()))
            .ok_or_else(|| CalculationError::missing(format!("allowances.{name}")))
    }

    /// VAT rate for a kind such as `standard` or `reduced`.
    pub fn vat_rate(
        &self,
        kind: &str,
    ) -> Result<Percent, CalculationError> {
        self.vat
            .get(kind)
            .copied()
            .ok_or_else(|| CalculationError::out_of_domain(format!("{} VAT rates", self.key()), kind))
    }

    /// Municipal multiplier for a schedule, by municipality name ignoring case.
    pub fn multiplier(
        &self,
        schedule: &str,
        municipality: &str,
    ) -> Result<Percent, CalculationError> {
        let table = self
            .multipliers
            .get(schedule)
            .ok_or_else(|| CalculationError::missing(format!("multipliers.{schedule}")))?;
        table
            .get(&municipality.trim().to_lowercase())
            .copied()
            .ok_or_else(|| {
                CalculationError::out_of_domain(
                    format!("{} {schedule} multipliers", self.key()),
                    municipality,
                )
            })
    }

    /// A whole factor table, e.g. `imu_coefficients`.
    pub fn factor_table(
        &self,
        name: &str,
    ) -> Result<&BTreeMap<String, Decimal>, CalculationError> {
        self.factors
            .get(name)
            .ok_or_else(|| CalculationError::missing(format!("factors.{name}")))
    }

    pub fn income_tariff(&self) -> Result<&IncomeTariff, CalculationError> {
        self.income_tariff
            .as_ref()
            .ok_or_else(|| CalculationError::missing("income_tariff"))
    }

    /// Checks every bracket schedule.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidTable`] naming the first bad schedule.
    pub fn validate(&self) -> Result<(), CalculationError> {
        for (name, table) in &self.brackets {
            table
                .validate()
                .map_err(|source| CalculationError::InvalidTable {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn tables() -> YearTables {
        let mut tables = YearTables::new(Country::Germany, 2025);
        tables.vat.insert("standard".into(), Percent::new(dec!(19)));
        tables.multipliers.insert(
            "trade_tax".into(),
            BTreeMap::from([("munich".into(), Percent::new(dec!(490)))]),
        );
        tables
            .amounts
            .insert("saver_allowance".into(), dec!(1000));
        tables
    }

    #[test]
    fn vat_rate_finds_known_kind() {
        assert_eq!(tables().vat_rate("standard"), Ok(Percent::new(dec!(19))));
    }

    #[test]
    fn vat_rate_reports_unknown_kind_as_out_of_domain() {
        assert_eq!(
            tables().vat_rate("super_reduced"),
            Err(CalculationError::out_of_domain(
                "DE 2025 VAT rates",
                "super_reduced"
            ))
        );
    }

    #[test]
    fn multiplier_lookup_ignores_case() {
        assert_eq!(
            tables().multiplier("trade_tax", " Munich "),
            Ok(Percent::new(dec!(490)))
        );
    }

    #[test]
    fn multiplier_reports_unknown_municipality() {
        assert_eq!(
            tables().multiplier("trade_tax", "Atlantis"),
            Err(CalculationError::out_of_domain(
                "DE 2025 trade_tax multipliers",
                "Atlantis"
            ))
        );
    }

    #[test]
    fn multiplier_reports_missing_schedule() {
        assert_eq!(
            tables().multiplier("property_tax", "Munich"),
            Err(CalculationError::missing("multipliers.property_tax"))
        );
    }

    #[test]
    fn missing_amount_names_the_entry() {
        assert_eq!(
            tables().amount("trade_tax_allowance"),
            Err(CalculationError::missing("amounts.trade_tax_allowance"))
        );
    }

    #[test]
    fn missing_income_tariff_is_reported() {
        assert_eq!(
            tables().income_tariff(),
            Err(CalculationError::missing("income_tariff"))
        );
    }
}
