use crate::domain::features::FeatureTable;
use tracing::debug;

/// Splits a feature table into train and validation parts by position.
///
/// Rows are never shuffled: the validation part is the chronological tail,
/// so no future information can leak into training. This is the load-bearing
/// property of the whole pipeline; a random split would scatter rows whose
/// label horizons overlap across both sides.
pub fn temporal_split(table: &FeatureTable, validation_fraction: f64) -> (FeatureTable, FeatureTable) {
    let f = validation_fraction.clamp(0.0, 1.0);
    let n = table.len();
    let split = ((n as f64) * (1.0 - f)).floor() as usize;

    let train = FeatureTable {
        symbol: table.symbol.clone(),
        columns: table.columns.clone(),
        rows: table.rows[..split].to_vec(),
    };
    let validation = FeatureTable {
        symbol: table.symbol.clone(),
        columns: table.columns.clone(),
        rows: table.rows[split..].to_vec(),
    };
    debug!(
        "Temporal split: {} train rows, {} validation rows",
        train.len(),
        validation.len()
    );
    (train, validation)
}
