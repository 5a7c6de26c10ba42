// Local filesystem backend
//
// One pretty-printed JSON file per composite key, `{key}.json`, in a
// configured directory. I/O failures are logged and converted to soft
// failures rather than propagated, trading error visibility for
// availability.

use crate::Storage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use dicelog_core::StoredRecord;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Open (and create, idempotently) the storage directory.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to initialize storage directory {}", root.display()))?;
        info!("Local storage directory initialized: {}", root.display());
        Ok(Self { root })
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Names of the record files currently in the directory. Diagnostic
    /// only; errors are logged and yield an empty listing.
    pub async fn list(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Failed to list local storage directory: {}", err);
                return names;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }

        names
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<bool> {
        let data = match serde_json::to_vec_pretty(record) {
            Ok(data) => data,
            Err(err) => {
                warn!("Failed to serialize record for local storage: {}", err);
                return Ok(false);
            }
        };

        match tokio::fs::write(self.file_path(key), data).await {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!("Failed to store data locally: {}", err);
                Ok(false)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        let bytes = match tokio::fs::read(self.file_path(key)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                // read errors are deliberately folded into "absent"
                warn!("Failed to read data from local storage: {}", err);
                return Ok(None);
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!("Failed to parse stored record {}: {}", key, err);
                Ok(None)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.file_path(key)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(true),
            Err(err) => {
                warn!("Failed to delete data from local storage: {}", err);
                Ok(false)
            }
        }
    }
}
