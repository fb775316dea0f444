//! MarketLens Core: market data acquisition and the statistics pipeline.
//!
//! This crate contains:
//! - Data providers (Yahoo Finance) and the bulk download orchestrator
//! - Reshaping of raw bars into aligned price, volume and return tables
//! - Summary statistics (annualised return/volatility, Sharpe, drawdown)
//! - Pairwise correlation analysis
//! - Data-quality validation

pub mod correlation;
pub mod data;
pub mod reshape;
pub mod stats;
pub mod table;
pub mod validation;

pub use correlation::{
    correlation_analysis, correlation_matrix, CorrelatedPair, CorrelationAnalysis,
    CorrelationMatrix,
};
pub use reshape::{reshape, MarketData, ReshapeDiagnostics};
pub use stats::{compute_stats, summary_stats, SummaryRow, SummaryTable, SymbolStats};
pub use table::{SeriesTable, TableError};
pub use validation::{data_is_valid, validate, ValidationReport};
