use crate::infrastructure::smartcore_classifier::SmartcoreClassifier;
use crate::infrastructure::versioned_store::VersionedStore;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Versioned JSON blob store for trained models, one slot per symbol.
///
/// A missing model is a recoverable condition and loads as `None`.
/// Replacing a model is a fresh `put`; readers keep whatever version they
/// loaded, so training and inference only need external coordination when
/// they share a slot.
pub struct ModelStore {
    store: VersionedStore,
}

impl ModelStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: VersionedStore::new(data_dir.join("models"), "json"),
        }
    }

    pub fn put(&self, symbol: &str, model: &SmartcoreClassifier) -> Result<()> {
        let bytes = serde_json::to_vec(model).context("Failed to serialize model")?;
        let path = self.store.put(symbol, &bytes)?;
        info!("Stored model for {symbol} at {:?}", path);
        Ok(())
    }

    pub fn get_latest(&self, symbol: &str) -> Result<Option<SmartcoreClassifier>> {
        let Some(bytes) = self.store.get_latest(symbol)? else {
            warn!("No stored model for {symbol}");
            return Ok(None);
        };
        let model: SmartcoreClassifier =
            serde_json::from_slice(&bytes).context("Failed to deserialize model")?;
        info!("Loaded model for {symbol}");
        Ok(Some(model))
    }
}
