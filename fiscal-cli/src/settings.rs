//! Optional TOML settings file for the `fiscal` binary.
//!
//! ```toml
//! year = 2025
//! tables = "tables"          # directory of extra rate tables, relative to this file
//! format = "json"
//! log_level = "info"
//! log_file = "fiscal.log"
//!
//! [germany]
//! church_tax_rate = 9
//! municipality = "munich"
//!
//! [italy]
//! regional_surcharge = "1.73"
//! municipal_surcharge = "0.8"
//! ```
//!
//! Command-line flags take precedence over every entry.

use std::fs;
use std::path::{Path, PathBuf};

use fiscal_core::Percent;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::output::OutputFormat;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Tax year used when `--year` is not given. Without either, the newest
    /// loaded year of each country is used.
    pub year: Option<i32>,
    pub tables: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub germany: GermanySettings,
    pub italy: ItalySettings,
}

/// Defaults for the German calculators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GermanySettings {
    /// 8 or 9 for church members.
    pub church_tax_rate: Option<Percent>,
    /// Municipality whose multipliers apply to trade and property tax.
    pub municipality: Option<String>,
}

/// Defaults for the Italian calculators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItalySettings {
    pub regional_surcharge: Option<Percent>,
    pub municipal_surcharge: Option<Percent>,
}

impl Settings {
    /// Reads settings from `path`. Relative `tables` and `log_file` paths are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml_str(&content).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            settings.tables = settings.tables.map(|p| base.join(p));
            settings.log_file = settings.log_file.map(|p| base.join(p));
        }
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // ==================== parsing ====================

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn full_file() {
        let settings = Settings::from_toml_str(
            r#"
            year = 2024
            tables = "tables"
            format = "json"
            log_level = "debug"

            [germany]
            church_tax_rate = 9
            municipality = "Munich"

            [italy]
            regional_surcharge = "1.73"
            "#,
        )
        .unwrap();

        assert_eq!(settings.year, Some(2024));
        assert_eq!(settings.tables, Some(PathBuf::from("tables")));
        assert_eq!(settings.format, Some(OutputFormat::Json));
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert_eq!(settings.germany.church_tax_rate, Some(Percent::new(dec!(9))));
        assert_eq!(settings.germany.municipality.as_deref(), Some("Munich"));
        assert_eq!(settings.italy.regional_surcharge, Some(Percent::new(dec!(1.73))));
        assert_eq!(settings.italy.municipal_surcharge, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml_str("yaer = 2025").is_err());
        assert!(Settings::from_toml_str("[germany]\nhebesatz = 490").is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Settings::from_toml_str("format = \"yaml\"").is_err());
    }

    // ==================== load ====================

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Settings::load(Path::new("/no/such/dir/fiscal.toml"));

        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }
}
