use std::collections::BTreeMap;
use std::io::Read;

use fiscal_core::{BracketTable, BracketTableError, Country, JurisdictionKey, Percent, TaxBracket};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Bracket schedules grouped by jurisdiction, then schedule name.
pub type ScheduleSet = BTreeMap<JurisdictionKey, BTreeMap<String, BracketTable>>;

/// Errors that can occur when loading bracket overrides.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("schedule '{schedule}' for {key} is invalid: {source}")]
    InvalidSchedule {
        key: JurisdictionKey,
        schedule: String,
        #[source]
        source: BracketTableError,
    },
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a bracket CSV file.
///
/// - `country`: country code (`FR`, `DE`, `IT`, `UK`; `GB` and lowercase accepted)
/// - `tax_year`: the tax year (e.g. 2025)
/// - `schedule`: the schedule name the calculators read (e.g. `income_tax`)
/// - `lower_bound`: where the band starts
/// - `upper_bound`: where the band ends (empty for the unbounded top band)
/// - `rate`: the band's rate in percent (e.g. `11` for 11%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    #[serde(deserialize_with = "deserialize_country")]
    pub country: Country,
    pub tax_year: i32,
    pub schedule: String,
    pub lower_bound: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl BracketRecord {
    pub fn key(&self) -> JurisdictionKey {
        JurisdictionKey::new(self.country, self.tax_year)
    }
}

fn deserialize_country<'de, D>(deserializer: D) -> Result<Country, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let code = String::deserialize(deserializer)?;
    Country::parse(&code)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown country code '{code}'")))
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for bracket schedules from CSV files.
///
/// Records may come in any order; [`BracketLoader::group`] sorts each schedule
/// by lower bound and checks it is a valid progressive table before it can
/// replace a bundled one.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or a
    /// byte slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records into one validated table per (jurisdiction, schedule).
    ///
    /// # Errors
    ///
    /// Returns [`BracketLoaderError::InvalidSchedule`] for the first schedule
    /// with a gap, an overlap, a bounded top band or a negative rate.
    pub fn group(records: &[BracketRecord]) -> Result<ScheduleSet, BracketLoaderError> {
        let mut groups: BTreeMap<(JurisdictionKey, String), Vec<&BracketRecord>> =
            BTreeMap::new();

        for record in records {
            groups
                .entry((record.key(), record.schedule.clone()))
                .or_default()
                .push(record);
        }

        let mut schedules = ScheduleSet::new();
        for ((key, schedule), mut group_records) in groups {
            group_records.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));

            let brackets = group_records
                .iter()
                .map(|r| TaxBracket::new(r.lower_bound, r.upper_bound, Percent::new(r.rate)))
                .collect();
            let table = BracketTable::new(brackets).map_err(|source| {
                BracketLoaderError::InvalidSchedule {
                    key,
                    schedule: schedule.clone(),
                    source,
                }
            })?;

            schedules.entry(key).or_default().insert(schedule, table);
        }

        Ok(schedules)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "country,tax_year,schedule,lower_bound,upper_bound,rate\n";

    const TEST_CSV: &str = r#"country,tax_year,schedule,lower_bound,upper_bound,rate
FR,2025,income_tax,0,11497,0
FR,2025,income_tax,11497,29315,11
FR,2025,income_tax,29315,83823,30
FR,2025,income_tax,83823,180294,41
FR,2025,income_tax,180294,,45
IT,2025,irpef,0,28000,23
IT,2025,irpef,28000,50000,35
IT,2025,irpef,50000,,43
"#;

    fn csv(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    // ==================== parse ====================

    #[test]
    fn parse_single_bracket() {
        let records =
            BracketLoader::parse(csv("FR,2025,income_tax,0,11497,0").as_bytes()).unwrap();

        assert_eq!(
            records,
            vec![BracketRecord {
                country: Country::France,
                tax_year: 2025,
                schedule: "income_tax".to_string(),
                lower_bound: dec!(0),
                upper_bound: Some(dec!(11497)),
                rate: dec!(0),
            }]
        );
    }

    #[test]
    fn parse_unbounded_top_band() {
        let records =
            BracketLoader::parse(csv("UK,2025,stamp_duty,1500000,,12").as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].upper_bound, None);
        assert_eq!(records[0].rate, dec!(12));
    }

    #[test]
    fn parse_accepts_gb_and_lowercase_codes() {
        let records = BracketLoader::parse(
            csv("gb,2025,stamp_duty,0,,0\nde,2025,inheritance_class_i,0,,7").as_bytes(),
        )
        .unwrap();

        assert_eq!(records[0].country, Country::UnitedKingdom);
        assert_eq!(records[1].country, Country::Germany);
    }

    #[test]
    fn parse_fractional_rate() {
        let records =
            BracketLoader::parse(csv("FR,2025,custom,0,,5.5").as_bytes()).unwrap();

        assert_eq!(records[0].rate, dec!(5.5));
    }

    #[test]
    fn parse_empty_csv() {
        let records = BracketLoader::parse(HEADER.as_bytes()).unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn parse_rejects_missing_column() {
        let result = BracketLoader::parse("country,tax_year,schedule\nFR,2025,x".as_bytes());

        let Err(BracketLoaderError::CsvParse(msg)) = result else {
            panic!("expected CsvParse error, got {result:?}");
        };
        assert!(msg.contains("missing field"), "unexpected message: {msg}");
    }

    #[test]
    fn parse_rejects_bad_decimal() {
        let result = BracketLoader::parse(csv("FR,2025,income_tax,abc,11497,0").as_bytes());

        assert!(matches!(result, Err(BracketLoaderError::CsvParse(_))));
    }

    #[test]
    fn parse_rejects_unknown_country() {
        let result = BracketLoader::parse(csv("ES,2025,irpf,0,,19").as_bytes());

        let Err(BracketLoaderError::CsvParse(msg)) = result else {
            panic!("expected CsvParse error, got {result:?}");
        };
        assert!(msg.contains("unknown country code 'ES'"), "unexpected message: {msg}");
    }

    // ==================== group ====================

    #[test]
    fn group_builds_one_table_per_schedule() {
        let records = BracketLoader::parse(TEST_CSV.as_bytes()).unwrap();

        let schedules = BracketLoader::group(&records).unwrap();

        let france = &schedules[&JurisdictionKey::new(Country::France, 2025)];
        let italy = &schedules[&JurisdictionKey::new(Country::Italy, 2025)];
        assert_eq!(france["income_tax"].len(), 5);
        assert_eq!(italy["irpef"].len(), 3);
        assert_eq!(
            italy["irpef"].brackets()[1].rate,
            Percent::new(dec!(35))
        );
    }

    #[test]
    fn group_sorts_rows_by_lower_bound() {
        let records = BracketLoader::parse(
            csv("IT,2025,irpef,50000,,43\nIT,2025,irpef,0,28000,23\nIT,2025,irpef,28000,50000,35")
                .as_bytes(),
        )
        .unwrap();

        let schedules = BracketLoader::group(&records).unwrap();

        let irpef = &schedules[&JurisdictionKey::new(Country::Italy, 2025)]["irpef"];
        let lowers: Vec<_> = irpef.brackets().iter().map(|b| b.lower_bound).collect();
        assert_eq!(lowers, vec![dec!(0), dec!(28000), dec!(50000)]);
    }

    #[test]
    fn group_rejects_gap_between_bands() {
        let records = BracketLoader::parse(
            csv("IT,2025,irpef,0,28000,23\nIT,2025,irpef,30000,,35").as_bytes(),
        )
        .unwrap();

        let result = BracketLoader::group(&records);

        match result {
            Err(BracketLoaderError::InvalidSchedule {
                ref schedule,
                source: BracketTableError::NotContiguous { .. },
                ..
            }) => assert_eq!(schedule, "irpef"),
            other => panic!("expected InvalidSchedule, got {other:?}"),
        }
    }

    #[test]
    fn group_rejects_bounded_top_band() {
        let records =
            BracketLoader::parse(csv("IT,2025,irpef,0,28000,23").as_bytes()).unwrap();

        assert!(matches!(
            BracketLoader::group(&records),
            Err(BracketLoaderError::InvalidSchedule {
                source: BracketTableError::LastBracketBounded,
                ..
            })
        ));
    }
}
