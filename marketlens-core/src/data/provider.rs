//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over market-data sources so the pipeline
//! can run against Yahoo Finance in production and a stub in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily OHLCV bar from a data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adj_close: f64,
}

impl RawBar {
    /// Adjusted close, falling back to the raw close when the provider
    /// did not supply an adjustment.
    pub fn price(&self) -> f64 {
        if self.adj_close.is_nan() {
            self.close
        } else {
            self.adj_close
        }
    }
}

/// Structured error types for data acquisition.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (HTTP 429)")]
    RateLimited,

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data downloaded for {symbols} between {start} and {end}; check the tickers and date range")]
    NoData {
        symbols: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
}

/// Trait for market-data providers.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError>;
}

/// Progress callback for multi-symbol downloads.
pub trait DownloadProgress {
    /// Called once before any symbol is fetched.
    fn on_batch_start(&self, provider: &str, symbols: &[String]);

    /// Called when a symbol fetch completes.
    fn on_complete(
        &self,
        symbol: &str,
        index: usize,
        total: usize,
        result: Result<usize, &DataError>,
    );
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_batch_start(&self, provider: &str, symbols: &[String]) {
        println!("Downloading stock data from {provider}...");
        println!("Tickers: {}", symbols.join(", "));
    }

    fn on_complete(
        &self,
        symbol: &str,
        index: usize,
        total: usize,
        result: Result<usize, &DataError>,
    ) {
        match result {
            Ok(rows) => println!("[{}/{}] {symbol}: {rows} rows", index + 1, total),
            Err(e) => println!("[{}/{}] {symbol}: FAILED ({e})", index + 1, total),
        }
    }
}

/// Progress reporter that reports nothing.
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn on_batch_start(&self, _provider: &str, _symbols: &[String]) {}

    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _result: Result<usize, &DataError>,
    ) {
    }
}
