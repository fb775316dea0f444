//! Serializable analysis configuration.
//!
//! Loaded from TOML. Every field except the symbol list and the date range
//! has a default, so a minimal file looks like:
//!
//! ```toml
//! symbols = ["AAPL", "MSFT"]
//! start_date = "2020-01-01"
//! end_date = "2024-01-01"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::heatmap::HeatmapStyle;

/// Errors from loading or validating an [`AnalysisConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no symbols configured")]
    NoSymbols,
    #[error("symbol '{0}' is listed more than once")]
    DuplicateSymbol(String),
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("date_format must not be empty")]
    EmptyDateFormat,
    #[error("heatmap_file must not be empty")]
    EmptyHeatmapFile,
}

/// Everything one analysis run needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Ticker symbols, in report order.
    pub symbols: Vec<String>,

    /// First calendar day to download (inclusive).
    pub start_date: NaiveDate,

    /// Last calendar day to download (inclusive).
    pub end_date: NaiveDate,

    /// Annual risk-free rate in percent (4.0 means 4%).
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Destination folder for CSVs, the workbook and the heatmap.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// strftime pattern for the date column of exported tables.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default = "default_heatmap_file")]
    pub heatmap_file: String,

    /// Stop after validation when the data has missing values.
    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub heatmap: HeatmapStyle,
}

fn default_risk_free_rate() -> f64 {
    4.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_heatmap_file() -> String {
    "correlation_heatmap.svg".to_string()
}

impl AnalysisConfig {
    /// A config with defaults for everything but the symbols and date range.
    pub fn new(symbols: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbols,
            start_date,
            end_date,
            risk_free_rate: default_risk_free_rate(),
            output_dir: default_output_dir(),
            date_format: default_date_format(),
            heatmap_file: default_heatmap_file(),
            strict: false,
            heatmap: HeatmapStyle::default(),
        }
    }

    /// Parse from a TOML string. Does not validate.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file, then validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for s in &self.symbols {
            if !seen.insert(s.as_str()) {
                return Err(ConfigError::DuplicateSymbol(s.clone()));
            }
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::EmptyDateFormat);
        }
        if self.heatmap_file.trim().is_empty() {
            return Err(ConfigError::EmptyHeatmapFile);
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new(
            ["AAPL", "MSFT", "GOOGL", "AMZN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        )
    }
}
