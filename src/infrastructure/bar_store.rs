use crate::domain::bar::{Bar, sanitize_bars};
use crate::domain::errors::DataError;
use crate::domain::ports::BarSource;
use crate::infrastructure::versioned_store::VersionedStore;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Versioned CSV store for raw bar series, one series per symbol.
pub struct CsvBarStore {
    store: VersionedStore,
}

impl CsvBarStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: VersionedStore::new(data_dir.join("bars"), "csv"),
        }
    }

    pub fn put(&self, symbol: &str, bars: &[Bar]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for bar in bars {
            writer
                .serialize(bar)
                .with_context(|| format!("Failed to encode bar at {}", bar.timestamp))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush bar CSV buffer: {e}"))?;
        self.store.put(symbol, &bytes)?;
        info!("Stored {} bars for {symbol}", bars.len());
        Ok(())
    }

    /// Most recently stored bar series for `symbol`, sanitized.
    ///
    /// A missing series is a normal outcome and returns an empty vector.
    pub fn get_latest(&self, symbol: &str) -> Result<Vec<Bar>> {
        let Some(bytes) = self.store.get_latest(symbol)? else {
            warn!("No stored bars for {symbol}");
            return Ok(Vec::new());
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut bars = Vec::new();
        for record in reader.deserialize() {
            let bar: Bar = record.context("Failed to decode bar CSV record")?;
            bars.push(bar);
        }
        let bars = sanitize_bars(bars);
        info!("Loaded {} bars for {symbol}", bars.len());
        Ok(bars)
    }
}

impl BarSource for CsvBarStore {
    fn fetch(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        self.get_latest(symbol).map_err(|e| {
            warn!("Bar store read failed for {symbol}: {e:#}");
            DataError::SourceFailure {
                symbol: symbol.to_string(),
                reason: format!("{e:#}"),
            }
        })
    }
}
