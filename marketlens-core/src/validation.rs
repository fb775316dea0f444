//! Data-quality checks over the price and return tables.
//!
//! Missing values fail validation. Extreme returns are informational only.

use crate::table::SeriesTable;
use tracing::warn;

/// Absolute daily return above which a move is flagged as extreme.
pub const EXTREME_RETURN: f64 = 0.5;

/// Outcome of validating one run's tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Columns of the return table with at least one missing value.
    pub missing_returns: Vec<(String, usize)>,
    /// Columns of the price table with at least one missing value.
    pub missing_prices: Vec<(String, usize)>,
    /// Columns with at least one |return| > 50%.
    pub extreme_returns: Vec<(String, usize)>,
}

impl ValidationReport {
    /// True when neither table has missing values. Extreme returns never
    /// affect this.
    pub fn passed(&self) -> bool {
        self.missing_returns.is_empty() && self.missing_prices.is_empty()
    }

    pub fn total_missing_returns(&self) -> usize {
        self.missing_returns.iter().map(|(_, n)| n).sum()
    }

    pub fn total_missing_prices(&self) -> usize {
        self.missing_prices.iter().map(|(_, n)| n).sum()
    }

    pub fn total_extreme_returns(&self) -> usize {
        self.extreme_returns.iter().map(|(_, n)| n).sum()
    }

    /// Console report, one message per check, with per-column counts when a
    /// check finds something.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if self.missing_returns.is_empty() {
            lines.push("No missing values in returns".to_string());
        } else {
            lines.push(format!(
                "Warning - Found {} missing values in returns",
                self.total_missing_returns()
            ));
            lines.extend(count_lines(&self.missing_returns));
        }

        if self.missing_prices.is_empty() {
            lines.push("No missing values in prices".to_string());
        } else {
            lines.push(format!(
                "Warning - Found {} missing values in prices",
                self.total_missing_prices()
            ));
            lines.extend(count_lines(&self.missing_prices));
        }

        if self.extreme_returns.is_empty() {
            lines.push("No extreme returns found".to_string());
        } else {
            lines.push(format!(
                "Warning - Found {} extreme returns",
                self.total_extreme_returns()
            ));
            lines.extend(count_lines(&self.extreme_returns));
        }

        lines
    }
}

fn count_lines(counts: &[(String, usize)]) -> Vec<String> {
    let width = counts.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
    counts
        .iter()
        .map(|(s, n)| format!("  {s:<width$}  {n}"))
        .collect()
}

fn nonzero(counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    counts.into_iter().filter(|(_, n)| *n > 0).collect()
}

/// Scan `returns` and `prices` for missing values and extreme returns.
pub fn validate(returns: &SeriesTable, prices: &SeriesTable) -> ValidationReport {
    let report = ValidationReport {
        missing_returns: nonzero(returns.missing_counts()),
        missing_prices: nonzero(prices.missing_counts()),
        extreme_returns: nonzero(returns.count_where(|r| r.abs() > EXTREME_RETURN)),
    };

    if !report.missing_returns.is_empty() {
        warn!(total = report.total_missing_returns(), columns = ?report.missing_returns, "missing values in returns");
    }
    if !report.missing_prices.is_empty() {
        warn!(total = report.total_missing_prices(), columns = ?report.missing_prices, "missing values in prices");
    }
    if !report.extreme_returns.is_empty() {
        warn!(total = report.total_extreme_returns(), columns = ?report.extreme_returns, "extreme returns found");
    }

    report
}

/// Convenience form of [`validate`] returning only the pass/fail signal.
pub fn data_is_valid(returns: &SeriesTable, prices: &SeriesTable) -> bool {
    validate(returns, prices).passed()
}
