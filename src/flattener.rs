//! Flattening of raw OSV advisories into one table.
//!
//! Reads `raw/<ecosystem>/*.json`, derives one [`FlatRow`] per advisory and
//! writes them to `osv-data.csv`. Files that fail to decode are logged and
//! skipped; they never abort the run.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::{FlatRow, OsvRecord, FLAT_COLUMNS};

/// An advisory file that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Rows produced by [`flatten`] plus the files it had to skip.
#[derive(Debug, Default)]
pub struct FlattenReport {
    pub rows: Vec<FlatRow>,
    pub skipped: Vec<SkippedFile>,
}

/// Reads every advisory under `raw_dir` into flat rows.
///
/// Each immediate subdirectory is one ecosystem; its name is copied into
/// the `ecosystem` column. Directories and files are visited in name order.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] if `raw_dir` does not exist, or an I/O
/// error if it cannot be listed.
pub fn flatten(raw_dir: &Path) -> Result<FlattenReport> {
    if !raw_dir.is_dir() {
        return Err(Error::MissingInput(raw_dir.to_path_buf()));
    }

    let mut ecosystem_dirs: Vec<PathBuf> = fs::read_dir(raw_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    ecosystem_dirs.sort();

    let mut report = FlattenReport::default();
    for dir in ecosystem_dirs {
        let Some(ecosystem) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let before = report.rows.len();
        for path in advisory_files(&dir) {
            match read_record(&path) {
                Ok(record) => report.rows.push(FlatRow::from_record(&ecosystem, &record)),
                Err(err) => {
                    error!("Skipping {}: {}", path.display(), err);
                    report.skipped.push(SkippedFile {
                        reason: err.to_string(),
                        path,
                    });
                }
            }
        }
        debug!("{}: {} records", ecosystem, report.rows.len() - before);
    }

    info!(
        "Fetched {} OSV records from all ecosystems ({} files skipped)",
        report.rows.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// `*.json` files directly inside `dir`, sorted by name.
fn advisory_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
        .collect()
}

fn read_record(path: &Path) -> Result<OsvRecord> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::JsonDecode {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes rows to `path` as CSV, replacing any previous file.
///
/// Creates the parent directory if needed.
pub fn write_table(rows: &[FlatRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(FLAT_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("OSV data saved to {}", path.display());
    Ok(())
}

/// Reads a table previously written by [`write_table`].
pub fn load_table(path: &Path) -> Result<Vec<FlatRow>> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<FlatRow>, _>>()?;
    Ok(rows)
}
