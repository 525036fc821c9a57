//! Stage runners over the on-disk layout.
//!
//! Each runner is one batch job: it reads the previous stage's file from the
//! [`DataLayout`], does its work and writes its own output. A runner that
//! fails its preconditions returns before writing anything.

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::DataLayout;
use crate::error::{Error, Result};
use crate::fetcher::{fetch_all, ArchiveSource, FetchReport};
use crate::flattener::{flatten, write_table, SkippedFile};
use crate::model::{Ecosystem, SummaryRow};
use crate::summarizer::{load_input, summarize, write_summary, YearRange};

/// Downloads `ecosystems` into `raw/`.
pub async fn run_fetch(
    layout: &DataLayout,
    source: &dyn ArchiveSource,
    ecosystems: &[Ecosystem],
) -> Result<FetchReport> {
    fetch_all(source, ecosystems, &layout.raw_dir()).await
}

/// What the flatten stage wrote.
#[derive(Debug)]
pub struct FlattenOutcome {
    pub output: PathBuf,
    pub rows: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Flattens `raw/` into `processed/osv-data.csv`.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] without a raw directory and
/// [`Error::EmptyDataset`] when no advisory could be read; neither case
/// touches an existing output file.
pub fn run_flatten(layout: &DataLayout) -> Result<FlattenOutcome> {
    let raw_dir = layout.raw_dir();
    let report = flatten(&raw_dir)?;

    if report.rows.is_empty() {
        error!("No OSV data found.");
        return Err(Error::EmptyDataset(raw_dir));
    }

    let output = layout.flat_csv();
    write_table(&report.rows, &output)?;

    Ok(FlattenOutcome {
        output,
        rows: report.rows.len(),
        skipped: report.skipped,
    })
}

/// Summarizes `processed/osv-data.csv` into `processed/osv_ecosystem_summary.csv`.
pub fn run_summarize(layout: &DataLayout, years: &YearRange) -> Result<Vec<SummaryRow>> {
    let input = load_input(&layout.flat_csv())?;
    info!("Loaded {} flattened rows", input.len());

    let summary = summarize(&input, years);
    write_summary(&summary, &layout.summary_csv())?;
    Ok(summary)
}
