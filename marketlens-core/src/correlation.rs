//! Pairwise Pearson correlation across return series, plus the high/low
//! correlated pair lists derived from the matrix's upper triangle.

use crate::table::SeriesTable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Pairs strictly above this are reported as highly correlated.
pub const HIGH_CORRELATION: f64 = 0.7;
/// Pairs strictly below this are reported as weakly correlated.
pub const LOW_CORRELATION: f64 = 0.3;

/// Symmetric correlation matrix indexed by symbol on both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    /// Row-major N×N values. `NaN` where a pair has too little overlapping
    /// data or a constant series.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.values[i][j])
    }

    /// Every unordered pair once (`i < j`), in matrix order.
    pub fn upper_triangle(&self) -> impl Iterator<Item = CorrelatedPair> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| {
            ((i + 1)..n).map(move |j| CorrelatedPair {
                first: self.symbols[i].clone(),
                second: self.symbols[j].clone(),
                correlation: self.values[i][j],
            })
        })
    }
}

/// One unordered symbol pair and its correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

/// Matrix plus the pairs that crossed either threshold.
#[derive(Debug, Clone)]
pub struct CorrelationAnalysis {
    pub matrix: CorrelationMatrix,
    /// Correlation > 0.7, strongest first.
    pub high: Vec<CorrelatedPair>,
    /// Correlation < 0.3, weakest first.
    pub low: Vec<CorrelatedPair>,
}

impl CorrelationAnalysis {
    /// Console report of both pair lists. An empty list is stated explicitly.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!("Pairs with correlation > {HIGH_CORRELATION}:"));
        if self.high.is_empty() {
            lines.push(format!("There are no pairs with correlation > {HIGH_CORRELATION}"));
        } else {
            lines.extend(pair_lines(&self.high));
        }
        lines.push(format!("Pairs with correlation < {LOW_CORRELATION}:"));
        if self.low.is_empty() {
            lines.push(format!("There are no pairs with correlation < {LOW_CORRELATION}"));
        } else {
            lines.extend(pair_lines(&self.low));
        }
        lines
    }
}

fn pair_lines(pairs: &[CorrelatedPair]) -> Vec<String> {
    let w1 = pairs.iter().map(|p| p.first.len()).max().unwrap_or(0).max("stock 1".len());
    let w2 = pairs.iter().map(|p| p.second.len()).max().unwrap_or(0).max("stock 2".len());
    let mut lines = vec![format!("{:>w1$} {:>w2$} {:>11}", "stock 1", "stock 2", "correlation")];
    lines.extend(
        pairs
            .iter()
            .map(|p| format!("{:>w1$} {:>w2$} {:>11.6}", p.first, p.second, p.correlation)),
    );
    lines
}

/// Pearson correlation over rows where both series are present.
///
/// Returns `NaN` with fewer than two complete rows or zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Pairwise Pearson matrix over every column of `returns`.
pub fn correlation_matrix(returns: &SeriesTable) -> CorrelationMatrix {
    let columns: Vec<(&str, &[f64])> = returns.iter_columns().collect();
    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        for j in i..n {
            let c = if i == j {
                // Self-correlation is 1 unless the series is constant or too short
                let own = pearson(columns[i].1, columns[i].1);
                if own.is_nan() {
                    f64::NAN
                } else {
                    1.0
                }
            } else {
                pearson(columns[i].1, columns[j].1)
            };
            values[i][j] = c;
            values[j][i] = c;
        }
    }

    CorrelationMatrix {
        symbols: columns.iter().map(|(s, _)| s.to_string()).collect(),
        values,
    }
}

/// Upper-triangle pairs with correlation strictly above `threshold`, strongest first.
pub fn high_pairs(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let mut pairs: Vec<CorrelatedPair> = matrix
        .upper_triangle()
        .filter(|p| p.correlation > threshold)
        .collect();
    pairs.sort_by(|a, b| {
        b.correlation
            .partial_cmp(&a.correlation)
            .unwrap_or(Ordering::Equal)
    });
    pairs
}

/// Upper-triangle pairs with correlation strictly below `threshold`, weakest first.
pub fn low_pairs(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let mut pairs: Vec<CorrelatedPair> = matrix
        .upper_triangle()
        .filter(|p| p.correlation < threshold)
        .collect();
    pairs.sort_by(|a, b| {
        a.correlation
            .partial_cmp(&b.correlation)
            .unwrap_or(Ordering::Equal)
    });
    pairs
}

/// Full correlation analysis with the standard 0.7 / 0.3 thresholds.
pub fn correlation_analysis(returns: &SeriesTable) -> CorrelationAnalysis {
    let matrix = correlation_matrix(returns);
    let high = high_pairs(&matrix, HIGH_CORRELATION);
    let low = low_pairs(&matrix, LOW_CORRELATION);
    CorrelationAnalysis { matrix, high, low }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn returns(columns: Vec<(&str, Vec<f64>)>) -> SeriesTable {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let dates = (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect();
        SeriesTable::new(
            dates,
            columns.into_iter().map(|(s, v)| (s.to_string(), v)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn identical_series_correlate_perfectly() {
        let r = vec![0.01, -0.02, 0.015, 0.003, -0.007];
        let t = returns(vec![("A", r.clone()), ("B", r)]);
        let analysis = correlation_analysis(&t);
        assert!((analysis.matrix.get("A", "B").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(analysis.high.len(), 1);
        assert_eq!(analysis.high[0].first, "A");
        assert_eq!(analysis.high[0].second, "B");
        assert!(analysis.low.is_empty());
    }

    #[test]
    fn mirrored_series_are_weak() {
        let r = vec![0.01, -0.02, 0.015, 0.003];
        let neg: Vec<f64> = r.iter().map(|v| -v).collect();
        let t = returns(vec![("A", r), ("B", neg)]);
        let analysis = correlation_analysis(&t);
        assert!((analysis.matrix.get("A", "B").unwrap() + 1.0).abs() < 1e-12);
        assert!(analysis.high.is_empty());
        assert_eq!(analysis.low.len(), 1);
    }

    #[test]
    fn diagonal_is_one_and_matrix_symmetric() {
        let t = returns(vec![
            ("A", vec![0.01, 0.02, -0.01, 0.0]),
            ("B", vec![0.03, -0.01, 0.02, 0.01]),
            ("C", vec![-0.02, 0.01, 0.0, 0.02]),
        ]);
        let m = correlation_matrix(&t);
        for i in 0..3 {
            assert_eq!(m.values[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
    }

    #[test]
    fn constant_series_is_undefined() {
        let t = returns(vec![("A", vec![0.25, 0.25, 0.25]), ("B", vec![0.01, 0.02, 0.03])]);
        let m = correlation_matrix(&t);
        assert!(m.values[0][0].is_nan());
        assert!(m.values[0][1].is_nan());
        assert_eq!(m.values[1][1], 1.0);
    }

    #[test]
    fn pearson_uses_pairwise_complete_rows() {
        let x = vec![1.0, 2.0, f64::NAN, 4.0];
        let y = vec![2.0, 4.0, 100.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_needs_two_rows() {
        assert!(pearson(&[1.0], &[2.0]).is_nan());
        assert!(pearson(&[1.0, f64::NAN], &[2.0, 3.0]).is_nan());
    }

    #[test]
    fn pair_lists_are_sorted() {
        let matrix = CorrelationMatrix {
            symbols: vec!["A".into(), "B".into(), "C".into()],
            values: vec![
                vec![1.0, 0.8, 0.95],
                vec![0.8, 1.0, 0.1],
                vec![0.95, 0.1, 1.0],
            ],
        };
        let high = high_pairs(&matrix, HIGH_CORRELATION);
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].correlation, 0.95);
        assert_eq!(high[1].correlation, 0.8);

        let low = low_pairs(&matrix, LOW_CORRELATION);
        assert_eq!(low.len(), 1);
        assert_eq!((low[0].first.as_str(), low[0].second.as_str()), ("B", "C"));
    }

    #[test]
    fn thresholds_are_strict() {
        let matrix = CorrelationMatrix {
            symbols: vec!["A".into(), "B".into(), "C".into()],
            values: vec![
                vec![1.0, 0.7, 0.3],
                vec![0.7, 1.0, 0.5],
                vec![0.3, 0.5, 1.0],
            ],
        };
        assert!(high_pairs(&matrix, HIGH_CORRELATION).is_empty());
        assert!(low_pairs(&matrix, LOW_CORRELATION).is_empty());
    }

    #[test]
    fn empty_lists_are_reported_explicitly() {
        let matrix = CorrelationMatrix {
            symbols: vec!["A".into(), "B".into()],
            values: vec![vec![1.0, 0.5], vec![0.5, 1.0]],
        };
        let analysis = CorrelationAnalysis {
            high: high_pairs(&matrix, HIGH_CORRELATION),
            low: low_pairs(&matrix, LOW_CORRELATION),
            matrix,
        };
        let lines = analysis.report_lines();
        assert!(lines.contains(&"There are no pairs with correlation > 0.7".to_string()));
        assert!(lines.contains(&"There are no pairs with correlation < 0.3".to_string()));
    }
}
