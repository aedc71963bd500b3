use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calculations::CalculationError;

/// The span between acquiring and disposing of an asset.
///
/// Construction rejects a disposal dated before the acquisition, including
/// construction through `Deserialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedPeriod")]
pub struct HoldingPeriod {
    acquired: NaiveDate,
    disposed: NaiveDate,
}

#[derive(Deserialize)]
struct UncheckedPeriod {
    acquired: NaiveDate,
    disposed: NaiveDate,
}

impl TryFrom<UncheckedPeriod> for HoldingPeriod {
    type Error = CalculationError;

    fn try_from(raw: UncheckedPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.acquired, raw.disposed)
    }
}

impl HoldingPeriod {
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] when `disposed` precedes `acquired`.
    pub fn new(
        acquired: NaiveDate,
        disposed: NaiveDate,
    ) -> Result<Self, CalculationError> {
        if disposed < acquired {
            return Err(CalculationError::invalid(
                "disposal_date",
                format!("sale on {disposed} precedes purchase on {acquired}"),
            ));
        }
        Ok(Self { acquired, disposed })
    }

    pub fn acquired(&self) -> NaiveDate {
        self.acquired
    }

    pub fn disposed(&self) -> NaiveDate {
        self.disposed
    }

    /// Whole anniversaries of the acquisition reached on or before disposal.
    pub fn completed_years(&self) -> u32 {
        let mut years = (self.disposed.year() - self.acquired.year()).max(0) as u32;
        while years > 0 && self.anniversary(years).is_none_or(|a| a > self.disposed) {
            years -= 1;
        }
        years
    }

    /// Whether strictly more than `years` years separate acquisition and disposal.
    pub fn exceeds_years(
        &self,
        years: u32,
    ) -> bool {
        self.anniversary(years)
            .is_some_and(|anniversary| self.disposed > anniversary)
    }

    // Feb 29 anniversaries fall back to Feb 28, as chrono's month arithmetic does.
    fn anniversary(
        &self,
        years: u32,
    ) -> Option<NaiveDate> {
        self.acquired.checked_add_months(Months::new(years.checked_mul(12)?))
    }
}

/// How long an asset was held, as entered by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Holding {
    /// Completed years only; the remainder is unknown and treated as zero.
    Years(u32),
    Dates(HoldingPeriod),
}

impl Holding {
    pub fn completed_years(&self) -> u32 {
        match self {
            Self::Years(years) => *years,
            Self::Dates(period) => period.completed_years(),
        }
    }

    /// Whether the holding lasted strictly longer than `years` years.
    ///
    /// With [`Holding::Years`] only whole years are known, so `n` completed
    /// years exceeds `years` only when `n > years`.
    pub fn exceeds_years(
        &self,
        years: u32,
    ) -> bool {
        match self {
            Self::Years(held) => *held > years,
            Self::Dates(period) => period.exceeds_years(years),
        }
    }
}

impl From<HoldingPeriod> for Holding {
    fn from(period: HoldingPeriod) -> Self {
        Self::Dates(period)
    }
}
