//! Summary statistics: pure functions over return and price series.
//!
//! Missing cells (`NaN`) are skipped by every aggregate. Nothing here guards
//! against degenerate inputs: a zero-volatility series produces an undefined
//! Sharpe ratio and that value is carried through to the report as-is.

use crate::table::SeriesTable;
use serde::{Deserialize, Serialize};

/// Trading periods per year used for annualisation.
pub const TRADING_DAYS: i32 = 252;

/// Column headers of the summary table, in display order.
pub const SUMMARY_COLUMNS: [&str; 7] = [
    "annualized_return",
    "annualized_volatility",
    "sharpe_ratio",
    "max_drawdown",
    "current_price",
    "start_price",
    "total_returns",
];

/// Unformatted per-symbol statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolStats {
    pub symbol: String,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub current_price: f64,
    pub start_price: f64,
    pub total_returns: f64,
}

impl SymbolStats {
    /// Compute all statistics for one symbol.
    ///
    /// `risk_free_rate` is an annual rate in percent (4.0 means 4%).
    pub fn compute(symbol: &str, returns: &[f64], prices: &[f64], risk_free_rate: f64) -> Self {
        let ann_ret = annualized_return(returns);
        let ann_vol = annualized_volatility(returns);
        let start = prices.first().copied().unwrap_or(f64::NAN);
        let current = prices.last().copied().unwrap_or(f64::NAN);
        Self {
            symbol: symbol.to_string(),
            annualized_return: ann_ret,
            annualized_volatility: ann_vol,
            sharpe_ratio: sharpe_ratio(ann_ret, ann_vol, risk_free_rate),
            max_drawdown: max_drawdown(prices),
            current_price: current,
            start_price: start,
            total_returns: total_return(start, current),
        }
    }

    /// Render as display strings.
    pub fn format(&self) -> SummaryRow {
        SummaryRow {
            symbol: self.symbol.clone(),
            annualized_return: format_pct(self.annualized_return),
            annualized_volatility: format_pct(self.annualized_volatility),
            sharpe_ratio: format!("{:.3}", self.sharpe_ratio),
            max_drawdown: format_pct(self.max_drawdown),
            current_price: format!("{:.2}", self.current_price),
            start_price: format!("{:.2}", self.start_price),
            total_returns: format_pct(self.total_returns),
        }
    }
}

/// One formatted row of the summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub symbol: String,
    pub annualized_return: String,
    pub annualized_volatility: String,
    pub sharpe_ratio: String,
    pub max_drawdown: String,
    pub current_price: String,
    pub start_price: String,
    pub total_returns: String,
}

impl SummaryRow {
    /// Cell values in `SUMMARY_COLUMNS` order.
    pub fn cells(&self) -> [&str; 7] {
        [
            self.annualized_return.as_str(),
            self.annualized_volatility.as_str(),
            self.sharpe_ratio.as_str(),
            self.max_drawdown.as_str(),
            self.current_price.as_str(),
            self.start_price.as_str(),
            self.total_returns.as_str(),
        ]
    }
}

/// Formatted summary statistics, one row per symbol. For reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn row(&self, symbol: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }

    /// Plain-text table with right-aligned columns.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = SUMMARY_COLUMNS.iter().map(|c| c.len()).collect();
        let index_width = self.rows.iter().map(|r| r.symbol.len()).max().unwrap_or(0);
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row.cells()) {
                *w = (*w).max(cell.len());
            }
        }

        let mut out = String::new();
        out.push_str(&" ".repeat(index_width));
        for (w, name) in widths.iter().copied().zip(SUMMARY_COLUMNS) {
            out.push_str(&format!("  {name:>w$}"));
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!("{:<index_width$}", row.symbol));
            for (w, cell) in widths.iter().copied().zip(row.cells()) {
                out.push_str(&format!("  {cell:>w$}"));
            }
            out.push('\n');
        }
        out
    }
}

/// Compute per-symbol statistics for every column of `returns`.
///
/// Prices are looked up by column name; a symbol absent from `prices`
/// gets undefined price-based fields.
pub fn compute_stats(
    returns: &SeriesTable,
    prices: &SeriesTable,
    risk_free_rate: f64,
) -> Vec<SymbolStats> {
    returns
        .iter_columns()
        .map(|(symbol, r)| {
            let p = prices.column(symbol).unwrap_or(&[]);
            SymbolStats::compute(symbol, r, p, risk_free_rate)
        })
        .collect()
}

/// Compute and format the summary table.
pub fn summary_stats(
    returns: &SeriesTable,
    prices: &SeriesTable,
    risk_free_rate: f64,
) -> SummaryTable {
    SummaryTable {
        rows: compute_stats(returns, prices, risk_free_rate)
            .iter()
            .map(SymbolStats::format)
            .collect(),
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// (1 + mean daily return)^252 − 1.
pub fn annualized_return(returns: &[f64]) -> f64 {
    (1.0 + mean(returns)).powi(TRADING_DAYS) - 1.0
}

/// Sample standard deviation of daily returns × √252.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * f64::from(TRADING_DAYS).sqrt()
}

/// (annualized return − rf/100) / annualized volatility. Unguarded.
pub fn sharpe_ratio(annualized_return: f64, annualized_volatility: f64, risk_free_rate: f64) -> f64 {
    (annualized_return - risk_free_rate / 100.0) / annualized_volatility
}

/// Deepest decline from a running peak, as a non-positive fraction.
///
/// The running peak starts at the first valid price. Returns `NaN` if the
/// series has no valid prices.
pub fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::NAN;
    let mut max_dd = f64::NAN;

    for &p in prices.iter().filter(|p| !p.is_nan()) {
        if peak.is_nan() || p > peak {
            peak = p;
        }
        let dd = (p - peak) / peak;
        if max_dd.is_nan() || dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// (current − start) / start.
pub fn total_return(start: f64, current: f64) -> f64 {
    (current - start) / start
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Mean of the non-missing values; `NaN` if there are none.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

/// Sample (n − 1) standard deviation of the non-missing values; `NaN` for
/// fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.len() < 2 {
        return f64::NAN;
    }
    let m = valid.iter().sum::<f64>() / valid.len() as f64;
    let var = valid.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (valid.len() - 1) as f64;
    var.sqrt()
}

fn format_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}
