use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "FR")]
    France,
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "IT")]
    Italy,
    #[serde(rename = "UK")]
    UnitedKingdom,
}

impl Country {
    pub const ALL: [Country; 4] = [
        Country::France,
        Country::Germany,
        Country::Italy,
        Country::UnitedKingdom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::France => "FR",
            Self::Germany => "DE",
            Self::Italy => "IT",
            Self::UnitedKingdom => "UK",
        }
    }

    /// Parses a country code. Case-insensitive; `GB` is accepted for the UK.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FR" => Some(Self::France),
            "DE" => Some(Self::Germany),
            "IT" => Some(Self::Italy),
            "UK" | "GB" => Some(Self::UnitedKingdom),
            _ => None,
        }
    }

    /// ISO 4217 code of the currency amounts are entered in.
    pub fn currency(&self) -> &'static str {
        match self {
            Self::UnitedKingdom => "GBP",
            _ => "EUR",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one version of one jurisdiction's rate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JurisdictionKey {
    pub country: Country,
    pub tax_year: i32,
}

impl JurisdictionKey {
    pub fn new(
        country: Country,
        tax_year: i32,
    ) -> Self {
        Self { country, tax_year }
    }
}

impl fmt::Display for JurisdictionKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} {}", self.country, self.tax_year)
    }
}
