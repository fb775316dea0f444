//! MarketLens Runner: configuration, orchestration and output artifacts.
//!
//! This crate builds on `marketlens-core` to provide:
//! - TOML analysis configuration with validation
//! - The end-to-end analysis runner (strict and lenient modes)
//! - CSV and Excel workbook export of the daily and summary tables
//! - The annotated correlation heatmap (SVG)

pub mod config;
pub mod export;
pub mod heatmap;
pub mod runner;

pub use config::{AnalysisConfig, ConfigError};
pub use export::{excel_date_format, write_tables, ExportError, WriteReport};
pub use heatmap::{export_heatmap, render_heatmap_svg, HeatmapOutcome, HeatmapStyle};
pub use runner::{
    analyze_prepared, prepare_data, run_analysis, AnalysisOutcome, AnalysisResults, PreparedData,
    RunError,
};
