//! Download orchestrator: one bulk "symbols + date range" request.
//!
//! Every symbol is fetched once, in request order. The combined result keeps
//! the shape the caller asked for: a flat bar list for a single symbol, or
//! per-symbol groups for several.

use super::provider::{DataError, DataProvider, DownloadProgress, RawBar};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Combined raw download for a set of symbols.
#[derive(Debug, Clone)]
pub enum RawDownload {
    /// Exactly one symbol was requested; bars carry no per-symbol grouping.
    Single(Vec<RawBar>),
    /// Several symbols were requested; bars grouped by symbol in request order.
    /// Symbols the provider could not find are absent.
    Grouped(Vec<(String, Vec<RawBar>)>),
}

impl RawDownload {
    /// Total number of bars across all symbols.
    pub fn row_count(&self) -> usize {
        match self {
            RawDownload::Single(bars) => bars.len(),
            RawDownload::Grouped(groups) => groups.iter().map(|(_, bars)| bars.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Download daily bars for `symbols` over `[start, end]`.
///
/// Fails with `DataError::NoData` when nothing came back for any symbol, and
/// with the provider's error on any network or response failure. A symbol the
/// provider reports as unknown is left out of a grouped download.
pub fn download_data(
    provider: &dyn DataProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    progress: &dyn DownloadProgress,
) -> Result<RawDownload, DataError> {
    if symbols.is_empty() {
        return Err(DataError::InvalidRequest("no symbols requested".into()));
    }
    if start > end {
        return Err(DataError::InvalidRequest(format!(
            "start date {start} is after end date {end}"
        )));
    }

    progress.on_batch_start(provider.name(), symbols);
    let total = symbols.len();
    let mut groups: Vec<(String, Vec<RawBar>)> = Vec::with_capacity(total);

    for (i, symbol) in symbols.iter().enumerate() {
        match provider.fetch(symbol, start, end) {
            Ok(fetched) => {
                progress.on_complete(symbol, i, total, Ok(fetched.bars.len()));
                groups.push((symbol.clone(), fetched.bars));
            }
            Err(e @ DataError::SymbolNotFound { .. }) => {
                warn!(symbol = %symbol, "provider has no such symbol");
                progress.on_complete(symbol, i, total, Err(&e));
            }
            Err(e) => {
                progress.on_complete(symbol, i, total, Err(&e));
                return Err(e);
            }
        }
    }

    let rows: usize = groups.iter().map(|(_, bars)| bars.len()).sum();
    if rows == 0 {
        return Err(DataError::NoData {
            symbols: symbols.join(", "),
            start,
            end,
        });
    }

    info!(symbols = total, rows, "download complete");

    if total == 1 {
        let bars = groups.pop().map(|(_, bars)| bars).unwrap_or_default();
        Ok(RawDownload::Single(bars))
    } else {
        Ok(RawDownload::Grouped(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{FetchResult, SilentProgress};
    use std::collections::HashMap;

    struct MapProvider {
        data: HashMap<String, Vec<RawBar>>,
        fail_on: Option<String>,
    }

    impl DataProvider for MapProvider {
        fn name(&self) -> &str {
            "map"
        }

        fn fetch(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            if self.fail_on.as_deref() == Some(symbol) {
                return Err(DataError::NetworkUnreachable("connection reset".into()));
            }
            self.data
                .get(symbol)
                .map(|bars| FetchResult {
                    symbol: symbol.to_string(),
                    bars: bars.clone(),
                })
                .ok_or_else(|| DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
        }
    }

    fn bar(day: u32, close: f64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
            adj_close: close,
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    fn provider() -> MapProvider {
        let mut data = HashMap::new();
        data.insert("AAA".to_string(), vec![bar(2, 10.0), bar(3, 11.0)]);
        data.insert("BBB".to_string(), vec![bar(2, 20.0), bar(3, 19.0)]);
        data.insert("EMPTY".to_string(), Vec::new());
        MapProvider {
            data,
            fail_on: None,
        }
    }

    #[test]
    fn single_symbol_is_flat() {
        let (start, end) = range();
        let raw = download_data(&provider(), &["AAA".into()], start, end, &SilentProgress).unwrap();
        assert!(matches!(raw, RawDownload::Single(ref bars) if bars.len() == 2));
    }

    #[test]
    fn several_symbols_are_grouped_in_order() {
        let (start, end) = range();
        let symbols = vec!["BBB".to_string(), "AAA".to_string()];
        let raw = download_data(&provider(), &symbols, start, end, &SilentProgress).unwrap();
        match raw {
            RawDownload::Grouped(groups) => {
                let names: Vec<&str> = groups.iter().map(|(s, _)| s.as_str()).collect();
                assert_eq!(names, vec!["BBB", "AAA"]);
            }
            other => panic!("expected grouped download, got {other:?}"),
        }
    }

    #[test]
    fn unknown_symbol_is_left_out() {
        let (start, end) = range();
        let symbols = vec!["AAA".to_string(), "NOPE".to_string()];
        let raw = download_data(&provider(), &symbols, start, end, &SilentProgress).unwrap();
        match raw {
            RawDownload::Grouped(groups) => assert_eq!(groups.len(), 1),
            other => panic!("expected grouped download, got {other:?}"),
        }
    }

    #[test]
    fn nothing_downloaded_is_no_data() {
        let (start, end) = range();
        let symbols = vec!["EMPTY".to_string(), "NOPE".to_string()];
        let err = download_data(&provider(), &symbols, start, end, &SilentProgress).unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
    }

    #[test]
    fn provider_failure_aborts_download() {
        let (start, end) = range();
        let mut p = provider();
        p.fail_on = Some("BBB".into());
        let symbols = vec!["AAA".to_string(), "BBB".to_string()];
        let err = download_data(&p, &symbols, start, end, &SilentProgress).unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(_)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let (start, end) = range();
        let err = download_data(&provider(), &["AAA".into()], end, start, &SilentProgress)
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));
    }
}
