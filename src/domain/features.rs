use crate::domain::signal::SignalClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fully-defined row of the feature table.
///
/// `values` is aligned with the owning table's `columns`; the label fields
/// live outside it so the feature matrix handed to a model can never
/// contain label information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<f64>,
    /// Percent change of close over the label horizon.
    pub target_return: f64,
    pub target: SignalClass,
}

impl FeatureRow {
    /// Name → value map of the feature columns, for result snapshots.
    pub fn snapshot(&self, columns: &[String]) -> BTreeMap<String, f64> {
        columns
            .iter()
            .cloned()
            .zip(self.values.iter().copied())
            .collect()
    }
}

/// A time-ordered labeled feature table for one symbol.
///
/// Invariants: rows are strictly increasing in timestamp, every row has a
/// value for every column, and every label was computable from the bar
/// history (full lookback behind it, full horizon ahead of it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub symbol: String,
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn empty(symbol: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            symbol: symbol.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature matrix (one inner vec per row, label columns excluded).
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.values.clone()).collect()
    }

    pub fn labels(&self) -> Vec<SignalClass> {
        self.rows.iter().map(|r| r.target).collect()
    }

    pub fn latest(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of a named column at a row, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r.values[col])
    }
}
