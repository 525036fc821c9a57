//! Core data types for advisories, ecosystems, and table rows.
//!
//! - [`Ecosystem`] - One of the package ecosystems published by OSV
//! - [`OsvRecord`] - The parsed subset of an OSV advisory document
//! - [`AdvisoryKind`] - Vulnerability or malicious-code classification
//! - [`FlatRow`] - One advisory as a row of `osv-data.csv`
//! - [`SummaryRow`] - One (ecosystem, type) row of the summary table
//!
//! # Example
//!
//! ```
//! use osvstats::model::{AdvisoryKind, FlatRow, OsvRecord};
//!
//! let record: OsvRecord = serde_json::from_str(r#"{"id": "MAL-2024-1"}"#).unwrap();
//! let row = FlatRow::from_record("npm", &record);
//!
//! assert_eq!(row.kind, AdvisoryKind::MaliciousCode);
//! ```

mod advisory;
mod ecosystem;
mod row;
pub mod timestamp;

pub use advisory::*;
pub use ecosystem::*;
pub use row::*;
