//! Raw download → aligned price, volume and return tables.

use crate::data::{align_symbols, RawBar, RawDownload};
use crate::table::{SeriesTable, TableError};
use tracing::{info, warn};

/// The three aligned tables every later stage works from.
#[derive(Debug, Clone)]
pub struct MarketData {
    /// Adjusted close per symbol.
    pub prices: SeriesTable,
    /// Traded volume per symbol.
    pub volume: SeriesTable,
    /// Day-over-day percent change of `prices`, leading row dropped.
    pub returns: SeriesTable,
    /// Requested symbols that had no data and were left out.
    pub skipped: Vec<String>,
}

/// Shapes and missing-value counts of freshly reshaped tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReshapeDiagnostics {
    pub prices_shape: (usize, usize),
    pub returns_shape: (usize, usize),
    pub prices_missing: usize,
    pub returns_missing: usize,
}

impl ReshapeDiagnostics {
    pub fn of(data: &MarketData) -> Self {
        Self {
            prices_shape: data.prices.shape(),
            returns_shape: data.returns.shape(),
            prices_missing: data.prices.total_missing(),
            returns_missing: data.returns.total_missing(),
        }
    }

    /// Console lines describing the processed tables.
    pub fn report_lines(&self) -> Vec<String> {
        vec![
            "Processed data:".to_string(),
            format!("Prices shape: {:?}", self.prices_shape),
            format!("Returns shape: {:?}", self.returns_shape),
            format!("Missing values in prices: {}", self.prices_missing),
            format!("Missing values in returns: {}", self.returns_missing),
        ]
    }
}

/// Build price, volume and return tables for `symbols` from a raw download.
///
/// Symbols with no bars in the download are skipped with a warning. Column
/// order follows `symbols`.
pub fn reshape(raw: RawDownload, symbols: &[String]) -> Result<MarketData, TableError> {
    let groups = resolve_groups(raw, symbols);

    let mut present: Vec<(String, Vec<RawBar>)> = Vec::with_capacity(symbols.len());
    let mut skipped = Vec::new();
    let mut pool = groups;

    for symbol in symbols {
        match pool.iter().position(|(s, bars)| s == symbol && !bars.is_empty()) {
            Some(i) => present.push(pool.swap_remove(i)),
            None => {
                warn!(symbol = %symbol, "no data found for ticker, skipping");
                skipped.push(symbol.clone());
            }
        }
    }

    let aligned = align_symbols(present);

    let mut price_cols = Vec::with_capacity(aligned.series.len());
    let mut volume_cols = Vec::with_capacity(aligned.series.len());
    for (symbol, bars) in &aligned.series {
        price_cols.push((symbol.clone(), bars.iter().map(RawBar::price).collect()));
        volume_cols.push((symbol.clone(), bars.iter().map(|b| b.volume).collect()));
    }

    let prices = SeriesTable::new(aligned.dates.clone(), price_cols)?;
    let volume = SeriesTable::new(aligned.dates, volume_cols)?;
    let returns = prices.pct_change().skip_rows(1);

    let data = MarketData {
        prices,
        volume,
        returns,
        skipped,
    };

    let diag = ReshapeDiagnostics::of(&data);
    info!(
        prices_shape = ?diag.prices_shape,
        returns_shape = ?diag.returns_shape,
        prices_missing = diag.prices_missing,
        returns_missing = diag.returns_missing,
        "processed data"
    );

    Ok(data)
}

/// Normalise both download shapes into `(symbol, bars)` groups.
fn resolve_groups(raw: RawDownload, symbols: &[String]) -> Vec<(String, Vec<RawBar>)> {
    match raw {
        RawDownload::Single(bars) => match symbols {
            [only] => vec![(only.clone(), bars)],
            _ => {
                warn!(
                    requested = symbols.len(),
                    "single-symbol download does not match the requested symbol set"
                );
                Vec::new()
            }
        },
        RawDownload::Grouped(groups) => groups,
    }
}
