// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    // The frontend URL is required and must normalize
    config.frontend()?;

    validate_request_config(&config.request)?;
    validate_storage_config(&config.storage)?;

    if let Some(ref server) = config.server {
        validate_server_config(server)?;
    }

    Ok(())
}

fn validate_request_config(config: &RequestConfig) -> Result<()> {
    if config.max_upload_bytes == 0 {
        bail!("request.max_upload_bytes must be greater than 0");
    }

    // Warn about very large ceilings; uploads are held in memory
    if config.max_upload_bytes > 100 * 1024 * 1024 {
        warn!(
            max_upload_bytes = config.max_upload_bytes,
            "request.max_upload_bytes is very large; uploads are buffered in memory"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;

            if fs.path.is_empty() {
                bail!("storage.fs.path must not be empty");
            }
        }
        StorageBackend::Kv => {
            let kv = config
                .kv
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("kv storage backend requires 'kv' configuration"))?;

            if kv.bucket.is_empty() {
                bail!("storage.kv.bucket is required for the kv backend");
            }

            if kv.endpoint.is_empty() {
                bail!("storage.kv.endpoint is required for the kv backend");
            }

            if kv.access_key_id.is_empty() {
                bail!("storage.kv.access_key_id is required for the kv backend");
            }

            if kv.secret_access_key.is_empty() {
                bail!("storage.kv.secret_access_key is required for the kv backend");
            }
        }
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    Ok(())
}
