// Hosted key-value backend
//
// The hosted store is reached through an opendal Operator over an
// S3-compatible endpoint and treated as an opaque put/get/delete-by-key
// service. Unlike the local backend, errors here propagate to the
// caller; only the backend's not-found condition maps to "absent".

use crate::Storage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use dicelog_core::StoredRecord;
use opendal::{ErrorKind, Operator};

pub struct KvStorage {
    op: Operator,
}

impl KvStorage {
    /// Wrap a prepared operator (tests use the memory service).
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// Connect to the hosted store over its S3-compatible endpoint.
    pub fn connect(
        bucket: &str,
        endpoint: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<Self> {
        let builder = opendal::services::S3::default()
            .bucket(bucket)
            .region("auto")
            .endpoint(endpoint)
            .access_key_id(access_key_id)
            .secret_access_key(secret_access_key);

        let op = Operator::new(builder)
            .context("Failed to configure hosted key-value store")?
            .finish();
        Ok(Self::new(op))
    }
}

#[async_trait]
impl Storage for KvStorage {
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<bool> {
        let data = serde_json::to_string(record).context("Failed to serialize record")?;
        self.op
            .write(key, data.into_bytes())
            .await
            .with_context(|| format!("Hosted store write failed for {}", key))?;
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        let buffer = match self.op.read(key).await {
            Ok(buffer) => buffer,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Hosted store read failed for {}", key))
            }
        };

        let record = serde_json::from_slice(&buffer.to_bytes())
            .with_context(|| format!("Hosted store returned an unparseable record for {}", key))?;
        Ok(Some(record))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.op
            .delete(key)
            .await
            .with_context(|| format!("Hosted store delete failed for {}", key))?;
        Ok(true)
    }
}
