// dicelog-config - Unified runtime configuration
//
// Supports configuration from multiple sources:
// 1. Environment variables (FRONTEND_URL / LOCAL_STORAGE_DIR / STORAGE_MODE
//    compatibility names, plus DICELOG_* prefixed overrides)
// 2. Config file path from DICELOG_CONFIG env var
// 3. Default config file location (./dicelog.toml)
// 4. Platform defaults (lowest priority, based on auto-detected Platform)

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod env;
mod frontend;
mod platform;
mod sources;
mod validation;

pub use env::{EnvSource, ENV_PREFIX};
pub use frontend::{FrontendUrl, FRONTEND_URL_MISSING};
pub use platform::Platform;

/// Main runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Externally-visible base URL used for retrieval links and CORS.
    /// Required; validated and normalized through [`FrontendUrl`].
    pub frontend_url: Option<String>,

    #[serde(default)]
    pub request: RequestConfig,

    pub storage: StorageConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
}

/// Request handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    pub max_upload_bytes: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kv: Option<KvConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Kv,
    Fs,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Kv => write!(f, "kv"),
            StorageBackend::Fs => write!(f, "fs"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "kv" | "hosted" | "edgeone" => Ok(StorageBackend::Kv),
            "fs" | "filesystem" | "local" => Ok(StorageBackend::Fs),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: kv, fs", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

/// Hosted key-value store reached over an S3-compatible endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KvConfig {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Include error chains in 500 bodies. Off by default; only for
    /// trusted/internal deployments.
    #[serde(default)]
    pub debug_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            debug_errors: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Platform defaults before any file or environment input
    pub fn from_platform_defaults(platform: Platform) -> Self {
        let defaults = platform.defaults();
        let backend: StorageBackend = defaults
            .storage_backend
            .parse()
            .expect("platform default backend is well-known");

        Self {
            frontend_url: None,
            request: RequestConfig {
                max_upload_bytes: defaults.max_upload_bytes,
            },
            storage: StorageConfig {
                backend,
                fs: Some(FsConfig::default()),
                kv: match backend {
                    StorageBackend::Kv => Some(KvConfig::default()),
                    StorageBackend::Fs => None,
                },
            },
            server: Some(ServerConfig::default()),
        }
    }

    /// Load configuration from all sources for the detected platform.
    /// Not yet validated; call [`RuntimeConfig::validate`] after any
    /// further overrides.
    pub fn load_or_default() -> Result<Self> {
        let platform = Platform::detect();
        sources::load_config(platform)
    }

    /// Load configuration for a specific platform (useful for testing)
    pub fn load_for_platform(platform: Platform) -> Result<Self> {
        sources::load_config(platform)
    }

    /// Load configuration starting from an explicit config file path
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Resolve and normalize the frontend URL, failing with the bilingual
    /// diagnostic when it was never configured.
    pub fn frontend(&self) -> Result<FrontendUrl> {
        FrontendUrl::resolve(self.frontend_url.as_deref().unwrap_or(""))
    }
}
