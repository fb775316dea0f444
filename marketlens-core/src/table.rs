//! Date-indexed numeric tables.
//!
//! `SeriesTable` is the single representation used for prices, volume and
//! returns: an ascending, unique date index and one `f64` column per symbol.
//! `NaN` marks a missing cell.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Days between 0001-01-01 (CE) and 1970-01-01, for polars `Date` encoding.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("date index must be strictly ascending")]
    UnsortedDates,
}

/// A table of `f64` columns sharing one date index.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl SeriesTable {
    /// Build a table, checking that every column matches the index length,
    /// column names are unique and the index is strictly ascending.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Result<Self, TableError> {
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TableError::UnsortedDates);
        }

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != dates.len() {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: dates.len(),
                    actual: column.len(),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(TableError::DuplicateColumn(name));
            }
            names.push(name);
            values.push(column);
        }

        Ok(Self {
            dates,
            names,
            values,
        })
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i].as_slice())
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .zip(&self.values)
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.names.is_empty()
    }

    /// Missing (`NaN`) cell count per column, in column order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.iter_columns()
            .map(|(name, col)| (name.to_string(), col.iter().filter(|v| v.is_nan()).count()))
            .collect()
    }

    pub fn total_missing(&self) -> usize {
        self.values
            .iter()
            .map(|col| col.iter().filter(|v| v.is_nan()).count())
            .sum()
    }

    /// Per-column count of cells matching `pred`. Missing cells never match.
    pub fn count_where(&self, pred: impl Fn(f64) -> bool) -> Vec<(String, usize)> {
        self.iter_columns()
            .map(|(name, col)| {
                let n = col.iter().filter(|v| !v.is_nan() && pred(**v)).count();
                (name.to_string(), n)
            })
            .collect()
    }

    /// Percent change between consecutive rows. The first row is `NaN`, and
    /// so is any cell whose own or previous value is missing.
    pub fn pct_change(&self) -> Self {
        let values = self
            .values
            .iter()
            .map(|col| {
                let mut out = Vec::with_capacity(col.len());
                if !col.is_empty() {
                    out.push(f64::NAN);
                }
                out.extend(col.windows(2).map(|w| (w[1] - w[0]) / w[0]));
                out
            })
            .collect();

        Self {
            dates: self.dates.clone(),
            names: self.names.clone(),
            values,
        }
    }

    /// Drop the first `n` rows.
    pub fn skip_rows(&self, n: usize) -> Self {
        let n = n.min(self.n_rows());
        Self {
            dates: self.dates[n..].to_vec(),
            names: self.names.clone(),
            values: self.values.iter().map(|col| col[n..].to_vec()).collect(),
        }
    }

    /// Convert to a polars `DataFrame` with the date index restored as a
    /// leading `Date`-typed column named `index_name`. Missing cells become nulls.
    pub fn to_dataframe(&self, index_name: &str) -> PolarsResult<DataFrame> {
        let days: Vec<i32> = self
            .dates
            .iter()
            .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();
        let date_col = Series::new(index_name.into(), days).cast(&DataType::Date)?;

        let mut columns: Vec<Column> = Vec::with_capacity(self.n_cols() + 1);
        columns.push(date_col.into());
        for (name, col) in self.iter_columns() {
            let cells: Vec<Option<f64>> = col
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) })
                .collect();
            columns.push(Series::new(name.into(), cells).into());
        }

        DataFrame::new(columns)
    }
}
