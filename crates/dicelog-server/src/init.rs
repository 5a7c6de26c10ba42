// Initialization utilities for server mode
//
// Storage backend and logging/tracing setup

use anyhow::Result;
use dicelog_config::{LogFormat, RuntimeConfig, ServerConfig, StorageBackend};
use dicelog_storage::{FsStorage, KvStorage, Storage};
use std::sync::Arc;
use tracing::info;

/// Initialize the storage backend from RuntimeConfig
pub async fn init_storage(config: &RuntimeConfig) -> Result<Arc<dyn Storage>> {
    info!(
        "Initializing storage backend: {}",
        config.storage.backend
    );

    match config.storage.backend {
        StorageBackend::Fs => {
            let fs = config
                .storage
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs config required for filesystem backend"))?;
            info!("Using local file storage at: {}", fs.path);

            Ok(Arc::new(FsStorage::new(&fs.path).await?))
        }
        StorageBackend::Kv => {
            let kv = config
                .storage
                .kv
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("kv config required for hosted backend"))?;
            info!(
                "Using hosted key-value store: bucket={}, endpoint={}",
                kv.bucket, kv.endpoint
            );

            Ok(Arc::new(KvStorage::connect(
                &kv.bucket,
                &kv.endpoint,
                &kv.access_key_id,
                &kv.secret_access_key,
            )?))
        }
    }
}

/// Initialize tracing/logging from the server configuration
pub fn init_tracing(server: &ServerConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match server.log_format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Text => {
            registry.with(fmt::layer()).init();
        }
    }
}
