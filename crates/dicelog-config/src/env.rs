// Environment variable overrides
//
// Two namespaces apply on top of file and platform values:
// - unprefixed compatibility names the original deployments already use:
//   FRONTEND_URL, LOCAL_STORAGE_DIR, STORAGE_MODE
// - DICELOG_* prefixed overrides for everything else
//
// Reads go through the EnvSource trait so override logic is testable
// without mutating the process environment.

use crate::{KvConfig, LogFormat, RuntimeConfig, ServerConfig};
use anyhow::{Context, Result};

pub const ENV_PREFIX: &str = "DICELOG_";

pub trait EnvSource {
    /// Read a DICELOG_-prefixed variable
    fn get(&self, key: &str) -> Option<String>;

    /// Read a variable by its exact name
    fn get_raw(&self, key: &str) -> Option<String>;
}

pub(crate) fn apply_env_overrides(
    config: &mut RuntimeConfig,
    source: &dyn EnvSource,
) -> Result<()> {
    if let Some(url) = source.get_raw("FRONTEND_URL") {
        config.frontend_url = Some(url);
    }

    if let Some(dir) = source.get_raw("LOCAL_STORAGE_DIR") {
        config.storage.fs.get_or_insert_with(Default::default).path = dir;
    }

    if let Some(mode) = source.get_raw("STORAGE_MODE") {
        config.storage.backend = mode
            .parse()
            .with_context(|| format!("Invalid STORAGE_MODE value: {}", mode))?;
    }

    if let Some(backend) = source.get("STORAGE_BACKEND") {
        config.storage.backend = backend
            .parse()
            .with_context(|| format!("Invalid {}STORAGE_BACKEND value: {}", ENV_PREFIX, backend))?;
    }

    if let Some(max) = source.get("MAX_UPLOAD_BYTES") {
        config.request.max_upload_bytes = max
            .parse()
            .with_context(|| format!("Invalid {}MAX_UPLOAD_BYTES value: {}", ENV_PREFIX, max))?;
    }

    if let Some(addr) = source.get("LISTEN_ADDR") {
        server_mut(config).listen_addr = addr;
    }

    if let Some(level) = source.get("LOG_LEVEL") {
        server_mut(config).log_level = level;
    }

    if let Some(format) = source.get("LOG_FORMAT") {
        server_mut(config).log_format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => anyhow::bail!(
                "Invalid {}LOG_FORMAT value: {}. Supported: text, json",
                ENV_PREFIX,
                other
            ),
        };
    }

    if let Some(flag) = source.get("DEBUG_ERRORS") {
        server_mut(config).debug_errors = matches!(flag.as_str(), "1" | "true" | "yes");
    }

    apply_kv_overrides(config, source);

    Ok(())
}

fn apply_kv_overrides(config: &mut RuntimeConfig, source: &dyn EnvSource) {
    let bucket = source.get("KV_BUCKET");
    let endpoint = source.get("KV_ENDPOINT");
    let access_key_id = source.get("KV_ACCESS_KEY_ID");
    let secret_access_key = source.get("KV_SECRET_ACCESS_KEY");

    if bucket.is_none() && endpoint.is_none() && access_key_id.is_none() && secret_access_key.is_none() {
        return;
    }

    let kv = config
        .storage
        .kv
        .get_or_insert_with(KvConfig::default);

    if let Some(bucket) = bucket {
        kv.bucket = bucket;
    }
    if let Some(endpoint) = endpoint {
        kv.endpoint = endpoint;
    }
    if let Some(access_key_id) = access_key_id {
        kv.access_key_id = access_key_id;
    }
    if let Some(secret_access_key) = secret_access_key {
        kv.secret_access_key = secret_access_key;
    }
}

fn server_mut(config: &mut RuntimeConfig) -> &mut ServerConfig {
    config.server.get_or_insert_with(ServerConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Platform, StorageBackend};
    use std::collections::HashMap;

    struct MapSource(HashMap<String, String>);

    impl EnvSource for MapSource {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    fn source(pairs: &[(&str, &str)]) -> MapSource {
        MapSource(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_compatibility_names_apply() {
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        let env = source(&[
            ("FRONTEND_URL", "logs.example.com"),
            ("LOCAL_STORAGE_DIR", "/var/lib/dicelog"),
            ("STORAGE_MODE", "local"),
        ]);

        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.frontend_url.as_deref(), Some("logs.example.com"));
        assert_eq!(config.storage.fs.as_ref().unwrap().path, "/var/lib/dicelog");
        assert_eq!(config.storage.backend, StorageBackend::Fs);
    }

    #[test]
    fn test_storage_mode_edgeone_selects_kv() {
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        let env = source(&[("STORAGE_MODE", "edgeone")]);

        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Kv);
    }

    #[test]
    fn test_prefixed_overrides_apply() {
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        let env = source(&[
            ("DICELOG_MAX_UPLOAD_BYTES", "1048576"),
            ("DICELOG_LISTEN_ADDR", "127.0.0.1:9000"),
            ("DICELOG_LOG_FORMAT", "json"),
            ("DICELOG_DEBUG_ERRORS", "true"),
        ]);

        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.request.max_upload_bytes, 1_048_576);
        let server = config.server.as_ref().unwrap();
        assert_eq!(server.listen_addr, "127.0.0.1:9000");
        assert_eq!(server.log_format, LogFormat::Json);
        assert!(server.debug_errors);
    }

    #[test]
    fn test_kv_overrides_build_the_section() {
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        let env = source(&[
            ("DICELOG_KV_BUCKET", "dicelog"),
            ("DICELOG_KV_ENDPOINT", "https://kv.example.com"),
            ("DICELOG_KV_ACCESS_KEY_ID", "id"),
            ("DICELOG_KV_SECRET_ACCESS_KEY", "secret"),
        ]);

        apply_env_overrides(&mut config, &env).unwrap();

        let kv = config.storage.kv.as_ref().unwrap();
        assert_eq!(kv.bucket, "dicelog");
        assert_eq!(kv.endpoint, "https://kv.example.com");
        assert_eq!(kv.access_key_id, "id");
        assert_eq!(kv.secret_access_key, "secret");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        let env = source(&[("DICELOG_MAX_UPLOAD_BYTES", "two megabytes")]);
        assert!(apply_env_overrides(&mut config, &env).is_err());

        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        let env = source(&[("STORAGE_MODE", "postgres")]);
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }
}
