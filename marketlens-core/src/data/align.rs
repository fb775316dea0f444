//! Multi-symbol time alignment.
//!
//! Given bars for multiple symbols, align them to a common timeline.
//! Missing bars get strict NaN (no forward-fill of price data).

use super::provider::RawBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Bar data for multiple symbols on a common timeline.
#[derive(Debug)]
pub struct AlignedData {
    /// The common date axis (sorted ascending, unique).
    pub dates: Vec<NaiveDate>,
    /// Symbols in input order, each with one bar per entry in `dates`.
    pub series: Vec<(String, Vec<RawBar>)>,
}

/// Align multiple symbols to a common timeline.
///
/// For each date in the union of all symbols' dates, each symbol either
/// has a real bar or gets a void bar (all OHLCV set to NaN). Input order of
/// the symbols is preserved.
pub fn align_symbols(symbol_bars: Vec<(String, Vec<RawBar>)>) -> AlignedData {
    let dates: Vec<NaiveDate> = symbol_bars
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let series = symbol_bars
        .into_iter()
        .map(|(symbol, bars)| {
            let mut by_date: HashMap<NaiveDate, RawBar> =
                bars.into_iter().map(|b| (b.date, b)).collect();
            let aligned: Vec<RawBar> = dates
                .iter()
                .map(|date| by_date.remove(date).unwrap_or_else(|| void_bar(*date)))
                .collect();
            (symbol, aligned)
        })
        .collect();

    AlignedData { dates, series }
}

/// Create a void bar (all OHLCV = NaN) for a missing date.
fn void_bar(date: NaiveDate) -> RawBar {
    RawBar {
        date,
        open: f64::NAN,
        high: f64::NAN,
        low: f64::NAN,
        close: f64::NAN,
        volume: f64::NAN,
        adj_close: f64::NAN,
    }
}
