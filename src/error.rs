//! Error types for the osvstats pipeline.
//!
//! Every stage reports failures through [`Error`]. Network, archive and
//! decode failures affect one item and are recorded and skipped by the stage
//! loops; the remaining variants abort a stage.

use std::io;
use std::path::PathBuf;

use crate::model::Ecosystem;

/// The main error type for all pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The archive request could not be sent or its body could not be read.
    #[error("network error fetching {ecosystem}: {source}")]
    Network {
        ecosystem: Ecosystem,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("download of {ecosystem} archive failed with HTTP {status}")]
    HttpStatus {
        ecosystem: Ecosystem,
        status: reqwest::StatusCode,
    },

    /// The downloaded bytes are not a readable zip archive.
    #[error("corrupt archive for {ecosystem}: {source}")]
    CorruptArchive {
        ecosystem: Ecosystem,
        #[source]
        source: zip::result::ZipError,
    },

    /// An advisory file is not valid JSON for the OSV record shape.
    #[error("failed to decode {}: {source}", .path.display())]
    JsonDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An expected input directory or file does not exist.
    #[error("missing input: {} does not exist", .0.display())]
    MissingInput(PathBuf),

    /// The flattened table lacks columns the summarizer needs.
    #[error("{} is missing required columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    /// No advisory rows were produced from the raw data.
    #[error("no OSV records found under {}", .0.display())]
    EmptyDataset(PathBuf),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error (invalid values).
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = Error::MissingColumns {
            path: PathBuf::from("osv-data.csv"),
            columns: vec!["year".to_string(), "type".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "osv-data.csv is missing required columns: year, type"
        );
    }

    #[test]
    fn test_decode_error_names_file() {
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::JsonDecode {
            path: PathBuf::from("GHSA-1.json"),
            source: decode,
        };
        assert!(err.to_string().starts_with("failed to decode GHSA-1.json: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
