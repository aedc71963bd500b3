//! Rate tables keyed by jurisdiction and tax year.
//!
//! A table file holds one country's years as an array of `[[year]]` sections,
//! each deserializing straight into [`YearTables`]:
//!
//! ```toml
//! [[year]]
//! country = "IT"
//! tax_year = 2025
//!
//! [year.brackets]
//! irpef = [
//!     { lower_bound = 0, upper_bound = 28000, rate = 23 },
//!     { lower_bound = 28000, upper_bound = 50000, rate = 35 },
//!     { lower_bound = 50000, rate = 43 },
//! ]
//! ```
//!
//! Fractional values should be quoted (`rate = "0.031"`) so they load as exact
//! decimals rather than passing through a float.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fiscal_core::{CalculationError, Country, JurisdictionKey, YearTables};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::loader::{BracketLoaderError, ScheduleSet};

const BUNDLED: [(&str, &str); 4] = [
    ("fr.toml", include_str!("../data/fr.toml")),
    ("de.toml", include_str!("../data/de.toml")),
    ("it.toml", include_str!("../data/it.toml")),
    ("uk.toml", include_str!("../data/uk.toml")),
];

#[derive(Debug, Error)]
pub enum TablesError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {name}: {source}")]
    Toml {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Brackets(#[from] BracketLoaderError),

    #[error("no rate tables for {0}")]
    UnknownJurisdiction(JurisdictionKey),

    #[error("no rate tables for any {0} tax year")]
    UnknownCountry(Country),

    #[error("{name} defines {key} more than once")]
    Duplicate { name: String, key: JurisdictionKey },

    #[error("rate tables for {key} are invalid: {source}")]
    Invalid {
        key: JurisdictionKey,
        #[source]
        source: CalculationError,
    },
}

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default, rename = "year")]
    years: Vec<YearTables>,
}

/// Every loaded [`YearTables`], looked up by [`JurisdictionKey`].
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: BTreeMap<JurisdictionKey, YearTables>,
}

impl TableRegistry {
    /// Tables compiled into the crate: France, Germany, Italy and the UK for
    /// 2024 and 2025.
    pub fn bundled() -> Result<Self, TablesError> {
        let mut registry = Self::default();
        for (name, content) in BUNDLED {
            registry.extend(Self::from_toml_str(name, content)?);
        }
        Ok(registry)
    }

    /// Loads every `*.toml` file in `dir`, in file-name order.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable, unparsable or invalid file, or when two
    /// files define the same jurisdiction and year.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, TablesError> {
        let dir = dir.as_ref();
        let io_error = |source| TablesError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_error)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(io_error)?;
        paths.retain(|path| path.extension().is_some_and(|ext| ext == "toml"));
        paths.sort();

        let mut registry = Self::default();
        for path in paths {
            let file = Self::from_file(&path)?;
            for key in file.keys() {
                if registry.tables.contains_key(&key) {
                    return Err(TablesError::Duplicate {
                        name: path.display().to_string(),
                        key,
                    });
                }
            }
            registry.extend(file);
        }
        Ok(registry)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TablesError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TablesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&path.display().to_string(), &content)
    }

    /// Parses one table file; `name` only labels errors and logs.
    pub fn from_toml_str(
        name: &str,
        content: &str,
    ) -> Result<Self, TablesError> {
        let file: TableFile = toml::from_str(content).map_err(|source| TablesError::Toml {
            name: name.to_string(),
            source,
        })?;

        let mut tables = BTreeMap::new();
        for year in file.years {
            let key = year.key();
            year.validate()
                .map_err(|source| TablesError::Invalid { key, source })?;
            if tables.insert(key, year).is_some() {
                return Err(TablesError::Duplicate {
                    name: name.to_string(),
                    key,
                });
            }
        }

        info!(file = name, years = tables.len(), "loaded rate tables");
        Ok(Self { tables })
    }

    /// Adds `other`'s tables, replacing any year both define.
    pub fn extend(
        &mut self,
        other: TableRegistry,
    ) {
        for (key, tables) in other.tables {
            if self.tables.insert(key, tables).is_some() {
                debug!(%key, "rate tables replaced");
            }
        }
    }

    pub fn get(
        &self,
        key: JurisdictionKey,
    ) -> Result<&YearTables, TablesError> {
        self.tables
            .get(&key)
            .ok_or(TablesError::UnknownJurisdiction(key))
    }

    /// The most recent tax year loaded for `country`.
    pub fn latest(
        &self,
        country: Country,
    ) -> Result<&YearTables, TablesError> {
        self.tables
            .values()
            .filter(|tables| tables.country == country)
            .max_by_key(|tables| tables.tax_year)
            .ok_or(TablesError::UnknownCountry(country))
    }

    /// `year` if given, otherwise the latest year.
    pub fn resolve(
        &self,
        country: Country,
        year: Option<i32>,
    ) -> Result<&YearTables, TablesError> {
        match year {
            Some(year) => self.get(JurisdictionKey::new(country, year)),
            None => self.latest(country),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = JurisdictionKey> + '_ {
        self.tables.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Replaces bracket schedules with the ones in `schedules`, typically from
    /// [`BracketLoader::group`](crate::BracketLoader::group). Returns how many
    /// schedules were written.
    ///
    /// # Errors
    ///
    /// Returns [`TablesError::UnknownJurisdiction`] if a schedule targets a
    /// year that is not loaded; nothing is changed in that case.
    pub fn apply_brackets(
        &mut self,
        schedules: ScheduleSet,
    ) -> Result<usize, TablesError> {
        if let Some(key) = schedules.keys().find(|key| !self.tables.contains_key(key)) {
            return Err(TablesError::UnknownJurisdiction(*key));
        }

        let mut applied = 0;
        for (key, by_name) in schedules {
            let Some(tables) = self.tables.get_mut(&key) else {
                continue;
            };
            for (name, table) in by_name {
                info!(%key, schedule = %name, bands = table.len(), "bracket schedule overridden");
                tables.brackets.insert(name, table);
                applied += 1;
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use fiscal_core::{BracketTable, BracketTableError, Percent, TaxBracket};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const MINIMAL: &str = r#"
[[year]]
country = "IT"
tax_year = 2030

[year.brackets]
irpef = [
    { lower_bound = 0, upper_bound = 28000, rate = 23 },
    { lower_bound = 28000, rate = 35 },
]
"#;

    fn key(
        country: Country,
        year: i32,
    ) -> JurisdictionKey {
        JurisdictionKey::new(country, year)
    }

    // ==================== bundled ====================

    #[test]
    fn bundled_covers_four_countries_and_two_years() {
        let registry = TableRegistry::bundled().unwrap();

        assert_eq!(registry.len(), 8);
        for country in Country::ALL {
            for year in [2024, 2025] {
                assert!(registry.get(key(country, year)).is_ok(), "{country} {year}");
            }
        }
    }

    #[test]
    fn bundled_fractions_load_exactly() {
        let registry = TableRegistry::bundled().unwrap();
        let germany = registry.get(key(Country::Germany, 2025)).unwrap();

        assert_eq!(
            germany.rate("property_tax_residential"),
            Ok(Percent::new(dec!(0.031)))
        );
        assert_eq!(germany.rate("solidarity_surcharge"), Ok(Percent::new(dec!(5.5))));
        assert_eq!(
            germany.income_tariff().map(|t| t.zone2_factor),
            Ok(dec!(932.30))
        );
    }

    #[test]
    fn bundled_multipliers_are_keyed_by_lowercase_city() {
        let registry = TableRegistry::bundled().unwrap();
        let germany = registry.get(key(Country::Germany, 2025)).unwrap();

        assert_eq!(
            germany.multiplier("trade_tax", "Munich"),
            Ok(Percent::new(dec!(490)))
        );
        assert_eq!(
            germany.multiplier("property_tax", "Düsseldorf"),
            Ok(Percent::new(dec!(565)))
        );
    }

    // ==================== lookup ====================

    #[test]
    fn latest_picks_newest_year() {
        let registry = TableRegistry::bundled().unwrap();

        assert_eq!(registry.latest(Country::France).unwrap().tax_year, 2025);
    }

    #[test]
    fn resolve_prefers_explicit_year() {
        let registry = TableRegistry::bundled().unwrap();

        assert_eq!(
            registry.resolve(Country::France, Some(2024)).unwrap().tax_year,
            2024
        );
        assert_eq!(registry.resolve(Country::France, None).unwrap().tax_year, 2025);
    }

    #[test]
    fn unknown_year_is_reported() {
        let registry = TableRegistry::bundled().unwrap();

        let result = registry.get(key(Country::Italy, 1999));

        assert!(matches!(
            result,
            Err(TablesError::UnknownJurisdiction(k)) if k == key(Country::Italy, 1999)
        ));
    }

    #[test]
    fn latest_on_empty_registry_is_unknown_country() {
        let registry = TableRegistry::default();

        assert!(matches!(
            registry.latest(Country::Germany),
            Err(TablesError::UnknownCountry(Country::Germany))
        ));
    }

    // ==================== parsing ====================

    #[test]
    fn from_toml_str_reads_year_sections() {
        let registry = TableRegistry::from_toml_str("minimal.toml", MINIMAL).unwrap();

        let italy = registry.get(key(Country::Italy, 2030)).unwrap();
        assert_eq!(italy.bracket_table("irpef").unwrap().len(), 2);
        assert!(italy.vat.is_empty());
    }

    #[test]
    fn invalid_bracket_table_is_rejected() {
        let content = MINIMAL.replace("lower_bound = 28000", "lower_bound = 30000");

        let result = TableRegistry::from_toml_str("broken.toml", &content);

        match result {
            Err(TablesError::Invalid {
                source: CalculationError::InvalidTable { name, source },
                ..
            }) => {
                assert_eq!(name, "irpef");
                assert!(matches!(source, BracketTableError::NotContiguous { .. }));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_year_in_one_file_is_rejected() {
        let content = format!("{MINIMAL}\n{MINIMAL}");

        assert!(matches!(
            TableRegistry::from_toml_str("twice.toml", &content),
            Err(TablesError::Duplicate { .. })
        ));
    }

    #[test]
    fn malformed_toml_names_the_file() {
        let result = TableRegistry::from_toml_str("bad.toml", "[[year]\ncountry = ");

        let Err(TablesError::Toml { name, .. }) = result else {
            panic!("expected Toml error, got {result:?}");
        };
        assert_eq!(name, "bad.toml");
    }

    // ==================== overrides ====================

    #[test]
    fn extend_replaces_matching_years() {
        let mut registry = TableRegistry::bundled().unwrap();

        registry.extend(TableRegistry::from_toml_str("extra.toml", MINIMAL).unwrap());

        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn apply_brackets_overrides_schedule() {
        let mut registry = TableRegistry::bundled().unwrap();
        let table = BracketTable::new(vec![
            TaxBracket::new(dec!(0), Some(dec!(30000)), Percent::new(dec!(20))),
            TaxBracket::new(dec!(30000), None, Percent::new(dec!(40))),
        ])
        .unwrap();
        let schedules = ScheduleSet::from([(
            key(Country::Italy, 2025),
            BTreeMap::from([("irpef".to_string(), table.clone())]),
        )]);

        let applied = registry.apply_brackets(schedules).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(
            registry
                .get(key(Country::Italy, 2025))
                .unwrap()
                .bracket_table("irpef"),
            Ok(&table)
        );
    }

    #[test]
    fn apply_brackets_to_unknown_year_changes_nothing() {
        let mut registry = TableRegistry::bundled().unwrap();
        let before = registry.get(key(Country::Italy, 2025)).unwrap().clone();
        let table = BracketTable::new(vec![TaxBracket::new(
            dec!(0),
            None,
            Percent::new(dec!(10)),
        )])
        .unwrap();
        let schedules = ScheduleSet::from([
            (
                key(Country::Italy, 2025),
                BTreeMap::from([("irpef".to_string(), table.clone())]),
            ),
            (
                key(Country::Italy, 1990),
                BTreeMap::from([("irpef".to_string(), table)]),
            ),
        ]);

        let result = registry.apply_brackets(schedules);

        assert!(matches!(result, Err(TablesError::UnknownJurisdiction(_))));
        assert_eq!(registry.get(key(Country::Italy, 2025)).unwrap(), &before);
    }
}
