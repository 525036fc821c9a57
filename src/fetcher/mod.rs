//! Advisory archive download and extraction.
//!
//! The fetcher downloads one `all.zip` export per ecosystem into
//! `raw/<ecosystem>/`, unpacks it there and removes the archive. Ecosystems
//! are processed one at a time; a failure for one ecosystem is recorded in
//! the [`FetchReport`] and the loop moves on to the next.
//!
//! # Example
//!
//! ```no_run
//! use osvstats::fetcher::{fetch_all, OsvBucket};
//! use osvstats::model::Ecosystem;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bucket = OsvBucket::new()?;
//!     let report = fetch_all(&bucket, &[Ecosystem::CratesIo], Path::new("./data/osv/raw")).await?;
//!     println!("{} fetched, {} failed", report.fetched.len(), report.failed.len());
//!     Ok(())
//! }
//! ```

mod archive;
mod osv;

pub use archive::extract;
pub use osv::{OsvBucket, OSV_BUCKET_URL, USER_AGENT};

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::model::Ecosystem;

/// A place ecosystem archives can be downloaded from.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Returns the human-readable name of this source.
    fn name(&self) -> &'static str;

    /// Streams the zip export for `ecosystem` into `dest`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] or [`Error::HttpStatus`] if the archive
    /// cannot be retrieved.
    async fn download(
        &self,
        ecosystem: Ecosystem,
        dest: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;
}

/// The result of a successful ecosystem fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArchive {
    pub ecosystem: Ecosystem,
    pub dir: PathBuf,
    pub bytes: u64,
    pub entries: usize,
}

/// An ecosystem skipped during a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub ecosystem: Ecosystem,
    pub reason: String,
}

/// Per-ecosystem outcomes of a fetch run.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub fetched: Vec<FetchedArchive>,
    pub failed: Vec<FetchFailure>,
}

impl FetchReport {
    /// Records the outcome of one ecosystem, logging failures.
    pub fn record(&mut self, ecosystem: Ecosystem, outcome: Result<FetchedArchive>) {
        match outcome {
            Ok(fetched) => self.fetched.push(fetched),
            Err(err) => {
                match &err {
                    Error::Network { .. } | Error::HttpStatus { .. } => {
                        error!("Error downloading {}: {}", ecosystem, err)
                    }
                    Error::CorruptArchive { .. } => {
                        error!("Error extracting {}: {}", ecosystem, err)
                    }
                    _ => error!("Unexpected error for {}: {}", ecosystem, err),
                }
                self.failed.push(FetchFailure {
                    ecosystem,
                    reason: err.to_string(),
                });
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Downloads and unpacks the archive for one ecosystem into `base_dir/<ecosystem>/`.
///
/// The archive is staged in a temporary file inside the target directory
/// and removed whether or not extraction succeeds.
pub async fn fetch(
    source: &dyn ArchiveSource,
    ecosystem: Ecosystem,
    base_dir: &Path,
) -> Result<FetchedArchive> {
    let output_dir = base_dir.join(ecosystem.as_str());
    fs::create_dir_all(&output_dir)?;

    let staged = tempfile::Builder::new()
        .prefix("all.")
        .suffix(".zip")
        .tempfile_in(&output_dir)?;

    let bytes = {
        let mut file = tokio::fs::File::from_std(staged.reopen()?);
        source.download(ecosystem, &mut file).await?
    };
    info!("Downloaded {} archive from {} ({} bytes)", ecosystem, source.name(), bytes);

    let entries = extract(ecosystem, staged.reopen()?, &output_dir)?;
    staged.close()?;
    info!(
        "Extracted {} entries to {} and removed archive",
        entries,
        output_dir.display()
    );

    Ok(FetchedArchive {
        ecosystem,
        dir: output_dir,
        bytes,
        entries,
    })
}

/// Fetches each ecosystem in order, continuing past per-ecosystem failures.
///
/// # Errors
///
/// Only fails if `base_dir` itself cannot be created.
pub async fn fetch_all(
    source: &dyn ArchiveSource,
    ecosystems: &[Ecosystem],
    base_dir: &Path,
) -> Result<FetchReport> {
    fs::create_dir_all(base_dir)?;
    info!("Directory ensured: {}", base_dir.display());

    let mut report = FetchReport::default();
    for &ecosystem in ecosystems {
        let outcome = fetch(source, ecosystem, base_dir).await;
        report.record(ecosystem, outcome);
    }

    info!(
        "Fetched {} of {} ecosystems",
        report.fetched.len(),
        ecosystems.len()
    );
    Ok(report)
}
