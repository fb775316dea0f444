//! Property tests for table and correlation invariants.
//!
//! Uses proptest to verify:
//! 1. Return tables have one fewer row than their price table, same columns
//! 2. Correlation matrices are symmetric with a unit diagonal
//! 3. Pair lists never contain self pairs or both orientations of a pair
//! 4. Validation passes exactly when no cell is missing

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashSet;
use marketlens_core::correlation::{correlation_analysis, correlation_matrix};
use marketlens_core::table::SeriesTable;
use marketlens_core::validation::validate;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

/// A price table with 2–6 symbols and 3–40 rows.
fn arb_prices() -> impl Strategy<Value = SeriesTable> {
    (2usize..=6, 3usize..=40).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(arb_price(), rows), cols).prop_map(
            move |columns| {
                let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
                let dates = (0..rows)
                    .map(|i| start + chrono::Duration::days(i as i64))
                    .collect();
                let named = columns
                    .into_iter()
                    .enumerate()
                    .map(|(i, c)| (format!("S{i}"), c))
                    .collect();
                SeriesTable::new(dates, named).unwrap()
            },
        )
    })
}

// ── 1. Return table shape ────────────────────────────────────────────

proptest! {
    #[test]
    fn returns_drop_exactly_one_row(prices in arb_prices()) {
        let returns = prices.pct_change().skip_rows(1);
        prop_assert_eq!(returns.n_rows(), prices.n_rows() - 1);
        prop_assert_eq!(returns.column_names(), prices.column_names());
        prop_assert_eq!(returns.dates(), &prices.dates()[1..]);
    }
}

// ── 2. Matrix symmetry ───────────────────────────────────────────────

proptest! {
    #[test]
    fn correlation_is_symmetric_with_unit_diagonal(prices in arb_prices()) {
        let returns = prices.pct_change().skip_rows(1);
        let m = correlation_matrix(&returns);
        for i in 0..m.len() {
            let (_, col) = returns.iter_columns().nth(i).unwrap();
            let constant = col.windows(2).all(|w| w[0] == w[1]);
            if !constant {
                prop_assert_eq!(m.values[i][i], 1.0);
            }
            for j in 0..m.len() {
                let (a, b) = (m.values[i][j], m.values[j][i]);
                prop_assert!(a.to_bits() == b.to_bits(), "asymmetric at ({}, {})", i, j);
                if !a.is_nan() {
                    prop_assert!((-1.0..=1.0).contains(&a));
                }
            }
        }
    }
}

// ── 3. Pair uniqueness ───────────────────────────────────────────────

proptest! {
    #[test]
    fn pairs_are_unique_and_never_self(prices in arb_prices()) {
        let returns = prices.pct_change().skip_rows(1);
        let analysis = correlation_analysis(&returns);
        for list in [&analysis.high, &analysis.low] {
            let mut seen = HashSet::new();
            for p in list.iter() {
                prop_assert_ne!(&p.first, &p.second);
                let key = if p.first < p.second {
                    (p.first.clone(), p.second.clone())
                } else {
                    (p.second.clone(), p.first.clone())
                };
                prop_assert!(seen.insert(key), "pair reported twice");
            }
        }
        prop_assert!(analysis.high.windows(2).all(|w| w[0].correlation >= w[1].correlation));
        prop_assert!(analysis.low.windows(2).all(|w| w[0].correlation <= w[1].correlation));
    }
}

// ── 4. Validation signal ─────────────────────────────────────────────

proptest! {
    #[test]
    fn validation_fails_iff_cells_missing(prices in arb_prices(), hole in any::<bool>()) {
        let returns = prices.pct_change().skip_rows(1);
        let prices = if hole {
            let mut columns: Vec<(String, Vec<f64>)> = prices
                .iter_columns()
                .map(|(n, c)| (n.to_string(), c.to_vec()))
                .collect();
            columns[0].1[1] = f64::NAN;
            SeriesTable::new(prices.dates().to_vec(), columns).unwrap()
        } else {
            prices
        };
        prop_assert_eq!(validate(&returns, &prices).passed(), !hole);
    }
}
