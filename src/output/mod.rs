mod cli;
mod json;

pub use cli::{print_summary_table, render_summary_table};
pub use json::{print_summary_json, summary_to_json};

use crate::model::SummaryRow;
use anyhow::Result;

/// Output format for summary tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

pub fn print_summary(rows: &[SummaryRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_summary_table(rows),
        OutputFormat::Json => print_summary_json(rows),
    }
}
