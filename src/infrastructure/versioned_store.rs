use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Append-only versioned blob store on the local filesystem.
///
/// Each `put` writes `<key>_<version>.<ext>` under the root, where the
/// version is a millisecond UTC timestamp whose lexicographic order matches
/// chronological order. `get_latest` returns the newest blob for a key.
/// Writes go through a temp file and rename, so a concurrent reader never
/// observes a half-written blob.
pub struct VersionedStore {
    root: PathBuf,
    extension: String,
}

impl VersionedStore {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.to_string(),
        }
    }

    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create store directory {:?}", self.root))?;

        let version = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let path = self
            .root
            .join(format!("{key}_{version}.{}", self.extension));

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes)
            .with_context(|| format!("Failed to write blob to {:?}", temp_path))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to finalize blob at {:?}", path))?;

        info!("Stored {} bytes at {:?}", bytes.len(), path);
        Ok(path)
    }

    pub fn latest_path(&self, key: &str) -> Result<Option<PathBuf>> {
        if !self.root.exists() {
            return Ok(None);
        }
        let prefix = format!("{key}_");
        let suffix = format!(".{}", self.extension);
        let mut candidates: Vec<PathBuf> = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read store directory {:?}", self.root))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|name| name.starts_with(&prefix) && name.ends_with(&suffix))
                    .unwrap_or(false)
            })
            .collect();
        candidates.sort();
        Ok(candidates.pop())
    }

    pub fn get_latest(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.latest_path(key)? {
            Some(path) => {
                let bytes =
                    fs::read(&path).with_context(|| format!("Failed to read blob {:?}", path))?;
                Ok(Some(bytes))
            }
            None => Ok(None),
        }
    }
}
