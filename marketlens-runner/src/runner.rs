//! Analysis runner: wires acquisition, reshaping, validation, statistics,
//! correlation and persistence together.
//!
//! Two entry points:
//! - `prepare_data()`: download, reshape and validate. Used by `validate`.
//! - `run_analysis()`: the full pipeline. Used by `analyze`.

use thiserror::Error;
use tracing::{info, warn};

use marketlens_core::data::{download_data, DataError, DataProvider, DownloadProgress};
use marketlens_core::{
    compute_stats, correlation_analysis, reshape, validate, CorrelationAnalysis, MarketData,
    ReshapeDiagnostics, SummaryTable, SymbolStats, TableError, ValidationReport,
};

use crate::config::{AnalysisConfig, ConfigError};
use crate::export::{write_tables, ExportError, WriteReport};
use crate::heatmap::{export_heatmap, HeatmapOutcome};

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("error downloading data: {0}")]
    Data(#[from] DataError),
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Reshaped tables plus the checks run on them.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub data: MarketData,
    pub diagnostics: ReshapeDiagnostics,
    pub validation: ValidationReport,
}

/// Everything produced after validation.
#[derive(Debug)]
pub struct AnalysisResults {
    pub stats: Vec<SymbolStats>,
    pub summary: SummaryTable,
    pub correlation: CorrelationAnalysis,
    pub tables: WriteReport,
    pub heatmap: HeatmapOutcome,
}

/// Outcome of [`run_analysis`].
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub prepared: PreparedData,
    /// `None` when strict mode stopped the run after a failed validation.
    pub results: Option<AnalysisResults>,
}

impl AnalysisOutcome {
    pub fn halted(&self) -> bool {
        self.results.is_none()
    }
}

/// Download, reshape and validate the configured symbols.
pub fn prepare_data(
    config: &AnalysisConfig,
    provider: &dyn DataProvider,
    progress: &dyn DownloadProgress,
) -> Result<PreparedData, RunError> {
    config.validate()?;

    let raw = download_data(
        provider,
        &config.symbols,
        config.start_date,
        config.end_date,
        progress,
    )?;

    let data = reshape(raw, &config.symbols)?;
    let diagnostics = ReshapeDiagnostics::of(&data);
    let validation = validate(&data.returns, &data.prices);

    Ok(PreparedData {
        data,
        diagnostics,
        validation,
    })
}

/// Run the full pipeline and write every artifact to `config.output_dir`.
///
/// A failed validation is a warning unless `config.strict` is set, in which
/// case the run stops before any statistics or files are produced.
pub fn run_analysis(
    config: &AnalysisConfig,
    provider: &dyn DataProvider,
    progress: &dyn DownloadProgress,
) -> Result<AnalysisOutcome, RunError> {
    let prepared = prepare_data(config, provider, progress)?;

    if !prepared.validation.passed() {
        if config.strict {
            warn!("data validation failed, stopping (strict mode)");
            return Ok(AnalysisOutcome {
                prepared,
                results: None,
            });
        }
        warn!("data validation failed, continuing with missing values");
    }

    let results = analyze_prepared(config, &prepared.data)?;
    Ok(AnalysisOutcome {
        prepared,
        results: Some(results),
    })
}

/// Statistics, correlation and persistence over already-prepared tables.
/// No network I/O.
pub fn analyze_prepared(
    config: &AnalysisConfig,
    data: &MarketData,
) -> Result<AnalysisResults, RunError> {
    let stats = compute_stats(&data.returns, &data.prices, config.risk_free_rate);
    let summary = SummaryTable {
        rows: stats.iter().map(SymbolStats::format).collect(),
    };
    let correlation = correlation_analysis(&data.returns);
    info!(
        symbols = correlation.matrix.len(),
        high = correlation.high.len(),
        low = correlation.low.len(),
        "correlation analysis complete"
    );

    let tables = write_tables(
        &data.prices,
        &data.returns,
        &data.volume,
        &summary,
        &config.output_dir,
        &config.date_format,
    )?;
    let heatmap = export_heatmap(
        &correlation.matrix,
        &config.output_dir,
        &config.heatmap_file,
        &config.heatmap,
    )?;

    Ok(AnalysisResults {
        stats,
        summary,
        correlation,
        tables,
        heatmap,
    })
}
