use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::advisory::{AdvisoryKind, OsvRecord};
use super::timestamp::{self, parse_timestamp};

/// Placeholder written for empty list columns.
pub const NONE_LITERAL: &str = "None";

/// Severity used when a record carries none.
pub const UNKNOWN_SEVERITY: &str = "UNKNOWN";

/// Placeholder for summary values computed over an all-null column.
pub const NOT_AVAILABLE: &str = "N/A";

const LIST_SEPARATOR: &str = ", ";

/// Column order of `osv-data.csv`.
pub const FLAT_COLUMNS: [&str; 13] = [
    "id",
    "type",
    "summary",
    "aliases",
    "ecosystem",
    "database_severity",
    "cwe_ids",
    "num_affected",
    "affected_packages",
    "modified",
    "published",
    "withdrawn",
    "year",
];

/// Column order of `osv_ecosystem_summary.csv`.
pub const SUMMARY_COLUMNS: [&str; 6] = [
    "ecosystem",
    "type",
    "total_affected",
    "most_affected_package",
    "peak_attack_year",
    "trend_data",
];

/// One advisory flattened into a CSV row.
///
/// Field order must match [`FLAT_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AdvisoryKind,
    pub summary: String,
    pub aliases: String,
    pub ecosystem: String,
    pub database_severity: String,
    pub cwe_ids: String,
    pub num_affected: usize,
    pub affected_packages: String,
    #[serde(with = "timestamp::optional")]
    pub modified: Option<NaiveDateTime>,
    #[serde(with = "timestamp::optional")]
    pub published: Option<NaiveDateTime>,
    #[serde(with = "timestamp::optional")]
    pub withdrawn: Option<NaiveDateTime>,
    pub year: Option<i32>,
}

impl FlatRow {
    /// Derives the flat row for `record` found under `ecosystem`.
    pub fn from_record(ecosystem: &str, record: &OsvRecord) -> Self {
        let id = record.id.clone().unwrap_or_default();
        let published = record.published.as_deref().and_then(parse_timestamp);

        Self {
            kind: AdvisoryKind::classify(&id),
            id,
            summary: record.summary.clone().unwrap_or_default(),
            aliases: join_or_none(record.aliases.iter().flatten().map(String::as_str)),
            ecosystem: ecosystem.to_string(),
            database_severity: record
                .database_severity()
                .unwrap_or_else(|| UNKNOWN_SEVERITY.to_string()),
            cwe_ids: join_or_none(record.cwe_ids()),
            num_affected: record.affected().len(),
            affected_packages: record.package_names().collect::<Vec<_>>().join(LIST_SEPARATOR),
            modified: record.modified.as_deref().and_then(parse_timestamp),
            published,
            withdrawn: record.withdrawn.as_deref().and_then(parse_timestamp),
            year: published.map(|ts| ts.year()),
        }
    }
}

fn join_or_none<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.into_iter().collect();
    if items.is_empty() {
        NONE_LITERAL.to_string()
    } else {
        items.join(LIST_SEPARATOR)
    }
}

/// First entry of a comma-joined package list.
pub fn first_package(joined: &str) -> &str {
    joined.split(LIST_SEPARATOR).next().unwrap_or(joined)
}

/// Aggregates for one (ecosystem, type) group.
///
/// Field order must match [`SUMMARY_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub ecosystem: String,
    #[serde(rename = "type")]
    pub kind: AdvisoryKind,
    pub total_affected: u64,
    pub most_affected_package: String,
    pub peak_attack_year: String,
    #[serde(
        serialize_with = "serialize_trend",
        deserialize_with = "deserialize_trend"
    )]
    pub trend_data: Vec<u64>,
}

/// Renders a trend vector as a list literal, e.g. `[0, 3, 1]`.
pub fn format_trend(trend: &[u64]) -> String {
    let items: Vec<String> = trend.iter().map(|n| n.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Parses a list literal written by [`format_trend`].
pub fn parse_trend(raw: &str) -> Option<Vec<u64>> {
    let inner = raw.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    inner
        .split(',')
        .map(|n| n.trim().parse::<u64>().ok())
        .collect()
}

fn serialize_trend<S>(trend: &[u64], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_trend(trend))
}

fn deserialize_trend<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_trend(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid trend list: {}", raw)))
}
