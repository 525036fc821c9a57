//! Configuration file handling.
//!
//! Configuration is loaded from a TOML file; a missing file means defaults.
//!
//! # Configuration Location
//!
//! - Linux: `~/.config/osvstats/config.toml`
//! - macOS: `~/Library/Application Support/osvstats/config.toml`
//! - Windows: `%APPDATA%\osvstats\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! data_dir = "./data/osv"
//! base_url = "https://osv-vulnerabilities.storage.googleapis.com"
//! ecosystems = ["npm", "PyPI", "crates.io"]
//! trend_start_year = 2014
//! trend_end_year = 2024
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::fetcher::{OSV_BUCKET_URL, USER_AGENT};
use crate::model::Ecosystem;
use crate::summarizer::YearRange;

/// Default root of the on-disk dataset.
pub const DEFAULT_DATA_DIR: &str = "./data/osv";

/// Name of the flattened advisory table.
pub const FLAT_CSV: &str = "osv-data.csv";

/// Name of the per-ecosystem summary table.
pub const SUMMARY_CSV: &str = "osv_ecosystem_summary.csv";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory holding `raw/` and `processed/`.
    ///
    /// Default: `./data/osv`
    pub data_dir: PathBuf,

    /// Base URL of the OSV export bucket.
    pub base_url: String,

    /// User-Agent sent with archive downloads.
    pub user_agent: String,

    /// Ecosystems downloaded by `fetch`, in order.
    ///
    /// Default: all supported ecosystems
    pub ecosystems: Vec<Ecosystem>,

    /// First year of the trend vector (inclusive).
    ///
    /// Default: 2014
    pub trend_start_year: i32,

    /// Last year of the trend vector (inclusive).
    ///
    /// Default: 2024
    pub trend_end_year: i32,
}

impl Default for Config {
    fn default() -> Self {
        let years = YearRange::default();
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            base_url: OSV_BUCKET_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            ecosystems: Ecosystem::ALL.to_vec(),
            trend_start_year: years.start(),
            trend_end_year: years.end(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path, with the same fallback as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.year_range()?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&path, self.to_toml()?)?;
        Ok(())
    }

    /// Serializes the configuration as it would be saved.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("osvstats")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// The configured trend years.
    ///
    /// # Errors
    ///
    /// Returns an error if the start year is after the end year.
    pub fn year_range(&self) -> crate::Result<YearRange> {
        YearRange::new(self.trend_start_year, self.trend_end_year)
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}

/// Paths of the files each stage reads and writes, relative to one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `raw/`, one subdirectory per ecosystem.
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn flat_csv(&self) -> PathBuf {
        self.processed_dir().join(FLAT_CSV)
    }

    pub fn summary_csv(&self) -> PathBuf {
        self.processed_dir().join(SUMMARY_CSV)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_toml_reflects_overrides() {
        let mut config = Config::default();
        config.data_dir = PathBuf::from("/srv/osv");

        let text = config.to_toml().unwrap();
        assert!(text.contains("data_dir = \"/srv/osv\""));
        assert!(text.contains("trend_start_year = 2014"));
        assert_eq!(config.layout().root(), Path::new("/srv/osv"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.data_dir, PathBuf::from("./data/osv"));
        assert_eq!(config.ecosystems.len(), 12);
        assert_eq!(config.trend_start_year, 2014);
        assert_eq!(config.trend_end_year, 2024);
        assert_eq!(config.year_range().unwrap().len(), 11);
        assert!(config.user_agent.contains("vuln-data-science"));
    }

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("/tmp/osv");
        assert_eq!(layout.raw_dir(), PathBuf::from("/tmp/osv/raw"));
        assert_eq!(
            layout.flat_csv(),
            PathBuf::from("/tmp/osv/processed/osv-data.csv")
        );
        assert_eq!(
            layout.summary_csv(),
            PathBuf::from("/tmp/osv/processed/osv_ecosystem_summary.csv")
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ecosystems, Ecosystem::ALL.to_vec());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "ecosystems = [\"npm\", \"crates.io\"]\ntrend_start_year = 2018\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.ecosystems, vec![Ecosystem::Npm, Ecosystem::CratesIo]);
        assert_eq!(config.trend_start_year, 2018);
        assert_eq!(config.trend_end_year, 2024);
        assert_eq!(config.data_dir, PathBuf::from("./data/osv"));
    }

    #[test]
    fn test_load_rejects_inverted_year_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "trend_start_year = 2025\ntrend_end_year = 2020\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = Config::generate_default_config();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.ecosystems, Config::default().ecosystems);
        assert_eq!(parsed.base_url, Config::default().base_url);
    }
}
