use crate::domain::features::{FeatureRow, FeatureTable};
use crate::domain::signal::SignalClass;
use crate::infrastructure::versioned_store::VersionedStore;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{info, warn};

/// Versioned CSV store for labeled feature tables.
///
/// The header is `timestamp`, the table's feature columns in order, then
/// `target_return` and `target` (as its class index). Values are written
/// with Rust's shortest round-trip float formatting, so store → load
/// reproduces the table exactly.
pub struct CsvFeatureStore {
    store: VersionedStore,
}

impl CsvFeatureStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: VersionedStore::new(data_dir.join("features"), "csv"),
        }
    }

    pub fn put(&self, table: &FeatureTable) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header: Vec<String> = Vec::with_capacity(table.columns.len() + 3);
        header.push("timestamp".to_string());
        header.extend(table.columns.iter().cloned());
        header.push("target_return".to_string());
        header.push("target".to_string());
        writer
            .write_record(&header)
            .context("Failed to write feature CSV header")?;

        for row in &table.rows {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            record.push(row.timestamp.to_rfc3339());
            record.extend(row.values.iter().map(|v| v.to_string()));
            record.push(row.target_return.to_string());
            record.push(row.target.class_index().to_string());
            writer
                .write_record(&record)
                .with_context(|| format!("Failed to write feature row at {}", row.timestamp))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush feature CSV buffer: {e}"))?;
        self.store.put(&table.symbol, &bytes)?;
        info!("Stored feature table for {} ({} rows)", table.symbol, table.len());
        Ok(())
    }

    /// Most recently stored table for `symbol`, or `None` if never stored.
    pub fn get_latest(&self, symbol: &str) -> Result<Option<FeatureTable>> {
        let Some(bytes) = self.store.get_latest(symbol)? else {
            warn!("No stored feature table for {symbol}");
            return Ok(None);
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let header = reader
            .headers()
            .context("Failed to read feature CSV header")?
            .clone();
        if header.len() < 3 {
            return Err(anyhow!("Feature CSV header too short: {} fields", header.len()));
        }
        let columns: Vec<String> = header
            .iter()
            .skip(1)
            .take(header.len() - 3)
            .map(|s| s.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read feature CSV record")?;
            let timestamp = DateTime::parse_from_rfc3339(&record[0])
                .with_context(|| format!("Bad timestamp in feature CSV: {}", &record[0]))?
                .with_timezone(&Utc);
            let values = record
                .iter()
                .skip(1)
                .take(columns.len())
                .map(|field| field.parse::<f64>().map_err(|e| anyhow!("Bad value {field:?}: {e}")))
                .collect::<Result<Vec<f64>>>()?;
            let target_return: f64 = record[columns.len() + 1]
                .parse()
                .map_err(|e| anyhow!("Bad target_return: {e}"))?;
            let class_index: usize = record[columns.len() + 2]
                .parse()
                .map_err(|e| anyhow!("Bad target class: {e}"))?;
            let target = SignalClass::from_class_index(class_index)
                .ok_or_else(|| anyhow!("Unknown target class index {class_index}"))?;
            rows.push(FeatureRow {
                timestamp,
                values,
                target_return,
                target,
            });
        }

        info!("Loaded feature table for {symbol} ({} rows)", rows.len());
        Ok(Some(FeatureTable {
            symbol: symbol.to_string(),
            columns,
            rows,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use std::path::PathBuf;

    fn test_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("fxcast_features_test_{name}_{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        dir
    }

    fn sample_table() -> FeatureTable {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        FeatureTable {
            symbol: "USDJPY".to_string(),
            columns: vec!["close".to_string(), "rsi".to_string()],
            rows: (0..4)
                .map(|i| FeatureRow {
                    timestamp: start + Duration::minutes(i as i64),
                    values: vec![145.0 + i as f64 * 0.0001, 48.123456789 + i as f64],
                    target_return: -0.05 + i as f64 * 0.04,
                    target: SignalClass::ALL[i % 3],
                })
                .collect(),
        }
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = test_dir("round_trip");
        let store = CsvFeatureStore::new(&dir);
        let table = sample_table();
        store.put(&table).unwrap();
        let loaded = store.get_latest("USDJPY").unwrap().unwrap();
        assert_eq!(loaded, table);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_symbol_is_none() {
        let dir = test_dir("missing");
        let store = CsvFeatureStore::new(&dir);
        assert!(store.get_latest("USDJPY").unwrap().is_none());
        fs::remove_dir_all(dir).ok();
    }
}
