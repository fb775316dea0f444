//! End-to-end runs of the analysis pipeline against an in-memory provider.

use chrono::NaiveDate;
use marketlens_core::data::{DataError, DataProvider, FetchResult, RawBar, SilentProgress};
use marketlens_runner::export::{PRICES_CSV, RETURNS_CSV, SUMMARY_CSV, VOLUME_CSV, WORKBOOK_FILE};
use marketlens_runner::heatmap::HeatmapOutcome;
use marketlens_runner::{prepare_data, run_analysis, AnalysisConfig, RunError};

struct StubProvider;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
}

fn bars(closes: &[(u32, f64)]) -> Vec<RawBar> {
    closes
        .iter()
        .map(|&(day, close)| RawBar {
            date: d(day),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10_000.0,
            adj_close: close,
        })
        .collect()
}

impl DataProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(&self, symbol: &str, _start: NaiveDate, _end: NaiveDate) -> Result<FetchResult, DataError> {
        let bars = match symbol {
            "UP" => bars(&[(1, 10.0), (2, 11.0), (3, 10.5), (4, 12.0), (5, 12.5)]),
            // Moves opposite to UP each day.
            "DOWN" => bars(&[(1, 50.0), (2, 45.0), (3, 48.0), (4, 40.0), (5, 38.0)]),
            "GAP" => bars(&[(2, 5.0), (3, 5.5), (4, 5.2), (5, 5.4)]),
            _ => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
        };
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
        })
    }
}

fn config(symbols: &[&str], out: &std::path::Path) -> AnalysisConfig {
    let mut cfg = AnalysisConfig::new(
        symbols.iter().map(|s| s.to_string()).collect(),
        d(1),
        d(30),
    );
    cfg.output_dir = out.to_path_buf();
    cfg
}

#[test]
fn full_run_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&["UP", "DOWN", "MISSING"], dir.path());

    let outcome = run_analysis(&cfg, &StubProvider, &SilentProgress).unwrap();
    assert!(!outcome.halted());
    assert_eq!(outcome.prepared.data.skipped, vec!["MISSING".to_string()]);
    assert_eq!(outcome.prepared.diagnostics.prices_shape, (5, 2));
    assert_eq!(outcome.prepared.diagnostics.returns_shape, (4, 2));
    assert!(outcome.prepared.validation.passed());

    let results = outcome.results.unwrap();
    assert_eq!(results.summary.rows.len(), 2);
    assert_eq!(results.stats[0].symbol, "UP");
    assert_eq!(results.summary.row("UP").unwrap().total_returns, "25.00%");

    let c = results.correlation.matrix.get("UP", "DOWN").unwrap();
    assert!(c < 0.0, "expected negative correlation, got {c}");
    assert!(results.correlation.high.is_empty());
    assert_eq!(results.correlation.low.len(), 1);

    for name in [PRICES_CSV, RETURNS_CSV, VOLUME_CSV, SUMMARY_CSV, WORKBOOK_FILE] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }
    assert!(results.tables.workbook_written());
    assert_eq!(
        results.heatmap,
        HeatmapOutcome::Saved(dir.path().join("correlation_heatmap.svg"))
    );
}

#[test]
fn second_run_replaces_heatmap() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&["UP", "DOWN"], dir.path());

    run_analysis(&cfg, &StubProvider, &SilentProgress).unwrap();
    let again = run_analysis(&cfg, &StubProvider, &SilentProgress).unwrap();
    let results = again.results.unwrap();
    assert!(matches!(results.heatmap, HeatmapOutcome::Replaced(_)));
}

#[test]
fn strict_mode_halts_on_missing_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["UP", "GAP"], dir.path());
    cfg.strict = true;

    let outcome = run_analysis(&cfg, &StubProvider, &SilentProgress).unwrap();
    assert!(outcome.halted());
    assert!(!outcome.prepared.validation.passed());
    assert!(!dir.path().join(PRICES_CSV).exists());
}

#[test]
fn lenient_mode_continues_on_missing_values() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&["UP", "GAP"], dir.path());

    let outcome = run_analysis(&cfg, &StubProvider, &SilentProgress).unwrap();
    assert!(!outcome.prepared.validation.passed());
    let results = outcome.results.unwrap();
    assert!(results.tables.csv_paths.iter().all(|p| p.is_file()));
}

#[test]
fn prepare_only_downloads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&["GAP"], dir.path());

    let prepared = prepare_data(&cfg, &StubProvider, &SilentProgress).unwrap();
    assert_eq!(prepared.data.prices.shape(), (4, 1));
    assert!(prepared.validation.passed());
    assert!(!dir.path().join(PRICES_CSV).exists());
}

#[test]
fn nothing_downloaded_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&["NOPE"], dir.path());

    let err = run_analysis(&cfg, &StubProvider, &SilentProgress).unwrap_err();
    assert!(matches!(err, RunError::Data(DataError::NoData { .. })));
}
