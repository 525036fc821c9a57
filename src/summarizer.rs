//! Per-ecosystem summary statistics.
//!
//! Groups the flattened table by (ecosystem, type) and computes, for each
//! group, the total number of affected packages, the most frequent
//! `affected_packages` value, the most frequent publication year, and a
//! per-year advisory count over a fixed range of years.
//!
//! The package mode is taken over the joined `affected_packages` strings as
//! they appear in the table; only afterwards is the winning string cut down
//! to its first package name.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::hash::Hash;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{first_package, AdvisoryKind, FlatRow, SummaryRow, NOT_AVAILABLE, SUMMARY_COLUMNS};

/// Columns the summarizer reads from `osv-data.csv`.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "ecosystem",
    "type",
    "num_affected",
    "affected_packages",
    "year",
];

const DEFAULT_START_YEAR: i32 = 2014;
const DEFAULT_END_YEAR: i32 = 2024;

/// Bounds on configurable trend years, which also keep `len` in range.
pub const MIN_TREND_YEAR: i32 = 1970;
pub const MAX_TREND_YEAR: i32 = 9999;

/// An inclusive range of calendar years for trend vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `start` is after `end` or either year
    /// lies outside [`MIN_TREND_YEAR`]..=[`MAX_TREND_YEAR`].
    pub fn new(start: i32, end: i32) -> Result<Self> {
        for year in [start, end] {
            if !(MIN_TREND_YEAR..=MAX_TREND_YEAR).contains(&year) {
                return Err(Error::config(format!(
                    "trend year {} is outside {}-{}",
                    year, MIN_TREND_YEAR, MAX_TREND_YEAR
                )));
            }
        }
        if start > end {
            return Err(Error::config(format!(
                "trend start year {} is after end year {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Position of `year` in a trend vector.
    pub fn index_of(&self, year: i32) -> Option<usize> {
        self.contains(year).then(|| (year - self.start) as usize)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl Default for YearRange {
    /// 2014 through 2024.
    fn default() -> Self {
        Self {
            start: DEFAULT_START_YEAR,
            end: DEFAULT_END_YEAR,
        }
    }
}

/// The slice of a flattened row the summarizer works on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryInput {
    pub ecosystem: String,
    #[serde(rename = "type")]
    pub kind: AdvisoryKind,
    #[serde(default, deserialize_with = "lenient_int")]
    pub num_affected: Option<u64>,
    #[serde(default)]
    pub affected_packages: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i32>,
}

impl From<&FlatRow> for SummaryInput {
    fn from(row: &FlatRow) -> Self {
        Self {
            ecosystem: row.ecosystem.clone(),
            kind: row.kind,
            num_affected: Some(row.num_affected as u64),
            affected_packages: Some(row.affected_packages.clone()),
            year: row.year,
        }
    }
}

/// Accepts `2020`, `2020.0` or an empty field.
///
/// Tables written by other tools store nullable integer columns as floats.
fn lenient_int<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let whole = match raw.parse::<i64>() {
        Ok(n) => n,
        Err(_) => match raw.parse::<f64>() {
            Ok(f) if f.is_nan() => return Ok(None),
            Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => {
                return Err(serde::de::Error::custom(format!(
                    "expected an integer, got {:?}",
                    raw
                )))
            }
        },
    };

    T::try_from(whole)
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("integer out of range: {}", whole)))
}

/// Occurrence counts that remember first-seen order for tie-breaking.
struct Tally<T> {
    counts: Vec<(T, u64)>,
    index: HashMap<T, usize>,
}

impl<T: Clone + Eq + Hash> Tally<T> {
    fn new() -> Self {
        Self {
            counts: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, value: T) {
        match self.index.get(&value) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(value.clone(), self.counts.len());
                self.counts.push((value, 1));
            }
        }
    }

    /// Most frequent value; the earliest seen wins ties.
    fn mode(&self) -> Option<&T> {
        let mut best: Option<&(T, u64)> = None;
        for entry in &self.counts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(value, _)| value)
    }
}

struct Group {
    kind: AdvisoryKind,
    total_affected: u64,
    packages: Tally<String>,
    years: Tally<i32>,
    trend: Vec<u64>,
}

/// Computes one summary row per (ecosystem, type), sorted by ecosystem then type.
pub fn summarize(rows: &[SummaryInput], years: &YearRange) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(String, &'static str), Group> = BTreeMap::new();

    for row in rows {
        let group = groups
            .entry((row.ecosystem.clone(), row.kind.as_str()))
            .or_insert_with(|| Group {
                kind: row.kind,
                total_affected: 0,
                packages: Tally::new(),
                years: Tally::new(),
                trend: vec![0; years.len()],
            });

        group.total_affected += row.num_affected.unwrap_or(0);

        if let Some(packages) = row.affected_packages.as_deref().filter(|p| !p.is_empty()) {
            group.packages.add(packages.to_string());
        }

        if let Some(year) = row.year {
            group.years.add(year);
            if let Some(i) = years.index_of(year) {
                group.trend[i] += 1;
            }
        }
    }

    groups
        .into_iter()
        .map(|((ecosystem, _), group)| SummaryRow {
            ecosystem,
            kind: group.kind,
            total_affected: group.total_affected,
            most_affected_package: group
                .packages
                .mode()
                .map(|joined| first_package(joined).to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            peak_attack_year: group
                .years
                .mode()
                .map(|year| year.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            trend_data: group.trend,
        })
        .collect()
}

/// Reads the summarizer's columns from a flattened CSV.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] if the file does not exist and
/// [`Error::MissingColumns`] if any of [`REQUIRED_COLUMNS`] is absent.
pub fn load_input(path: &Path) -> Result<Vec<SummaryInput>> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SummaryInput>, _>>()?;
    Ok(rows)
}

/// Writes summary rows to `path`, replacing any previous file.
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(SUMMARY_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Ecosystem summary saved to {}", path.display());
    Ok(())
}

/// Reads a summary table previously written by [`write_summary`].
pub fn load_summary(path: &Path) -> Result<Vec<SummaryRow>> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SummaryRow>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(ecosystem: &str, id_kind: AdvisoryKind, packages: &str, year: Option<i32>) -> SummaryInput {
        SummaryInput {
            ecosystem: ecosystem.to_string(),
            kind: id_kind,
            num_affected: Some(packages.split(", ").filter(|p| !p.is_empty()).count() as u64),
            affected_packages: (!packages.is_empty()).then(|| packages.to_string()),
            year,
        }
    }

    use crate::model::AdvisoryKind::{MaliciousCode as Mal, Vulnerability as Vuln};

    #[test]
    fn test_year_range_default() {
        let years = YearRange::default();
        assert_eq!(years.len(), 11);
        assert_eq!(years.years().next(), Some(2014));
        assert_eq!(years.years().last(), Some(2024));
        assert_eq!(years.index_of(2014), Some(0));
        assert_eq!(years.index_of(2024), Some(10));
        assert_eq!(years.index_of(2025), None);
        assert_eq!(years.index_of(2013), None);
        assert!(YearRange::new(2020, 2019).is_err());
        assert_eq!(YearRange::new(2020, 2020).unwrap().len(), 1);
    }

    #[test]
    fn test_year_range_rejects_out_of_bounds_years() {
        assert!(YearRange::new(i32::MIN, i32::MAX).is_err());
        assert!(YearRange::new(1969, 2024).is_err());
        assert!(YearRange::new(2014, 10_000).is_err());

        let widest = YearRange::new(MIN_TREND_YEAR, MAX_TREND_YEAR).unwrap();
        assert_eq!(widest.len(), 8030);
    }

    #[test]
    fn test_groups_are_sorted_by_ecosystem_then_type() {
        let rows = vec![
            input("npm", Vuln, "a", Some(2020)),
            input("PyPI", Vuln, "b", Some(2021)),
            input("npm", Mal, "c", Some(2022)),
        ];

        let summary = summarize(&rows, &YearRange::default());

        let keys: Vec<(&str, AdvisoryKind)> = summary
            .iter()
            .map(|s| (s.ecosystem.as_str(), s.kind))
            .collect();
        assert_eq!(keys, vec![("PyPI", Vuln), ("npm", Mal), ("npm", Vuln)]);
    }

    #[test]
    fn test_trend_vector_counts_in_range_years() {
        let rows = vec![
            input("Go", Vuln, "x", Some(2014)),
            input("Go", Vuln, "x", Some(2020)),
            input("Go", Vuln, "y", Some(2020)),
            input("Go", Vuln, "y", Some(2025)),
            input("Go", Vuln, "y", None),
        ];

        let summary = summarize(&rows, &YearRange::default());

        assert_eq!(summary.len(), 1);
        let trend = &summary[0].trend_data;
        assert_eq!(trend.len(), 11);
        assert_eq!(trend, &vec![1, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0]);
        assert_eq!(trend.iter().sum::<u64>(), 3);
        assert_eq!(summary[0].total_affected, 5);
    }

    #[test]
    fn test_all_null_years_give_na_and_zero_trend() {
        let rows = vec![input("Hex", Mal, "evil", None), input("Hex", Mal, "evil", None)];

        let summary = summarize(&rows, &YearRange::default());

        assert_eq!(summary[0].peak_attack_year, "N/A");
        assert_eq!(summary[0].trend_data, vec![0; 11]);
        assert_eq!(summary[0].most_affected_package, "evil");
    }

    #[test]
    fn test_all_null_packages_give_na() {
        let rows = vec![input("Pub", Vuln, "", Some(2019))];
        let summary = summarize(&rows, &YearRange::default());
        assert_eq!(summary[0].most_affected_package, "N/A");
        assert_eq!(summary[0].total_affected, 0);
        assert_eq!(summary[0].peak_attack_year, "2019");
    }

    #[test]
    fn test_package_mode_is_over_joined_strings() {
        // Counted per package `extra` would win; the joined value "lib, extra" is the mode.
        let rows = vec![
            input("npm", Vuln, "lib, extra", Some(2020)),
            input("npm", Vuln, "lib, extra", Some(2020)),
            input("npm", Vuln, "lib, extra", Some(2020)),
            input("npm", Vuln, "solo", Some(2020)),
            input("npm", Vuln, "solo", Some(2020)),
            input("npm", Vuln, "extra", Some(2020)),
            input("npm", Vuln, "extra", Some(2020)),
        ];

        let summary = summarize(&rows, &YearRange::default());
        assert_eq!(summary[0].most_affected_package, "lib");
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        let rows = vec![
            input("Maven", Vuln, "first", Some(2018)),
            input("Maven", Vuln, "second", Some(2017)),
            input("Maven", Vuln, "second", Some(2018)),
            input("Maven", Vuln, "first", Some(2017)),
        ];

        let summary = summarize(&rows, &YearRange::default());
        assert_eq!(summary[0].most_affected_package, "first");
        assert_eq!(summary[0].peak_attack_year, "2018");
    }

    #[test]
    fn test_custom_year_range_sets_trend_length() {
        let rows = vec![input("CRAN", Vuln, "r", Some(2023))];
        let years = YearRange::new(2020, 2024).unwrap();
        let summary = summarize(&rows, &years);
        assert_eq!(summary[0].trend_data, vec![0, 0, 0, 1, 0]);
    }

    #[test]
    fn test_load_input_requires_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("osv-data.csv");
        fs::write(&path, "id,ecosystem,type\nGHSA-1,npm,Vulnerability\n").unwrap();

        match load_input(&path).unwrap_err() {
            Error::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["num_affected", "affected_packages", "year"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_input(&dir.path().join("osv-data.csv")).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_load_input_accepts_float_years_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("osv-data.csv");
        fs::write(
            &path,
            "id,type,ecosystem,num_affected,affected_packages,year\n\
             A,Vulnerability,npm,2,\"a, b\",2020.0\n\
             B,Malicious Code,npm,1,,\n\
             C,Vulnerability,npm,,c,2019\n",
        )
        .unwrap();

        let rows = load_input(&path).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].year, Some(2020));
        assert_eq!(rows[0].affected_packages.as_deref(), Some("a, b"));
        assert_eq!(rows[1].kind, Mal);
        assert_eq!(rows[1].affected_packages, None);
        assert_eq!(rows[1].year, None);
        assert_eq!(rows[2].num_affected, None);
        assert_eq!(rows[2].year, Some(2019));
    }

    #[test]
    fn test_load_input_rejects_garbage_year() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("osv-data.csv");
        fs::write(
            &path,
            "ecosystem,type,num_affected,affected_packages,year\nnpm,Vulnerability,1,a,soon\n",
        )
        .unwrap();

        assert!(matches!(load_input(&path).unwrap_err(), Error::Csv(_)));
    }

    #[test]
    fn test_summary_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("osv_ecosystem_summary.csv");
        let rows = summarize(
            &[
                input("npm", Vuln, "a, b", Some(2016)),
                input("npm", Mal, "", None),
            ],
            &YearRange::default(),
        );

        write_summary(&rows, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("ecosystem,type,total_affected,most_affected_package,peak_attack_year,trend_data")
        );
        assert_eq!(
            lines.next(),
            Some("npm,Malicious Code,0,N/A,N/A,\"[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]\"")
        );

        assert_eq!(load_summary(&path).unwrap(), rows);
    }

    #[test]
    fn test_flat_rows_convert_to_input() {
        let record = serde_json::from_str(
            r#"{"id": "GHSA-z", "published": "2015-01-01T00:00:00Z",
                "affected": [{"package": {"name": "p"}}]}"#,
        )
        .unwrap();
        let flat = FlatRow::from_record("RubyGems", &record);
        let converted = SummaryInput::from(&flat);

        assert_eq!(converted.ecosystem, "RubyGems");
        assert_eq!(converted.num_affected, Some(1));
        assert_eq!(converted.year, Some(2015));
        assert_eq!(converted.affected_packages.as_deref(), Some("p"));
    }
}
