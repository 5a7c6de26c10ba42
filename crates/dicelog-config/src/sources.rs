// Configuration source loading
//
// Priority order:
// 1. Environment variables (compatibility names + DICELOG_* prefix)
// 2. Config file path from DICELOG_CONFIG
// 3. Default config file (./dicelog.toml)
// 4. Platform defaults (based on auto-detected Platform)

use crate::env::{apply_env_overrides, EnvSource, ENV_PREFIX};
use crate::platform::Platform;
use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Load configuration for the given platform using native environment/file
/// access. The result is not yet validated; callers run `validate` once
/// their own overrides (CLI flags) have been applied.
pub fn load_config(platform: Platform) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_platform_defaults(platform);

    if let Some(file_config) = load_from_file()? {
        merge_file(&mut config, file_config);
    }

    apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

/// Load configuration starting from a specific file path (for the CLI
/// --config flag). Errors if the file is missing or unparseable.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let file_config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    let platform = Platform::detect();
    let mut config = RuntimeConfig::from_platform_defaults(platform);
    merge_file(&mut config, file_config);

    apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

fn load_from_file() -> Result<Option<FileConfig>> {
    if let Ok(path) = env::var(format!("{}CONFIG", ENV_PREFIX)) {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    let path = "./dicelog.toml";
    if Path::new(path).exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    Ok(None)
}

/// Partial configuration as written in a TOML file. Every field is
/// optional; present values overwrite the platform defaults.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct FileConfig {
    frontend_url: Option<String>,
    request: Option<FileRequestConfig>,
    storage: Option<FileStorageConfig>,
    server: Option<FileServerConfig>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct FileRequestConfig {
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct FileStorageConfig {
    backend: Option<StorageBackend>,
    fs: Option<FsConfig>,
    kv: Option<KvConfig>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct FileServerConfig {
    listen_addr: Option<String>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
    debug_errors: Option<bool>,
}

fn merge_file(config: &mut RuntimeConfig, file: FileConfig) {
    if file.frontend_url.is_some() {
        config.frontend_url = file.frontend_url;
    }

    if let Some(request) = file.request {
        if let Some(max) = request.max_upload_bytes {
            config.request.max_upload_bytes = max;
        }
    }

    if let Some(storage) = file.storage {
        if let Some(backend) = storage.backend {
            config.storage.backend = backend;
        }
        if storage.fs.is_some() {
            config.storage.fs = storage.fs;
        }
        if storage.kv.is_some() {
            config.storage.kv = storage.kv;
        }
    }

    if let Some(server) = file.server {
        let target = config.server.get_or_insert_with(ServerConfig::default);
        if let Some(listen_addr) = server.listen_addr {
            target.listen_addr = listen_addr;
        }
        if let Some(log_level) = server.log_level {
            target.log_level = log_level;
        }
        if let Some(log_format) = server.log_format {
            target.log_format = log_format;
        }
        if let Some(debug_errors) = server.debug_errors {
            target.debug_errors = debug_errors;
        }
    }
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
