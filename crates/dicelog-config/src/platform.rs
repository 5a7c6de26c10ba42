// Platform detection based on environment variables
//
// Auto-detects the runtime environment:
// - Hosted: a key-value store binding is configured (DICELOG_KV_BUCKET)
// - Local: no binding present (default)

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Hosted,
    Local,
}

impl Platform {
    /// Auto-detect the current platform based on environment variables.
    ///
    /// Detection only feeds defaults; the storage backend stays an
    /// explicit config value that file and environment sources can
    /// override either way.
    pub fn detect() -> Self {
        if env::var("DICELOG_KV_BUCKET").is_ok() {
            Platform::Hosted
        } else {
            Platform::Local
        }
    }

    /// Get platform-specific defaults
    pub fn defaults(&self) -> PlatformDefaults {
        match self {
            Platform::Hosted => PlatformDefaults {
                max_upload_bytes: 2 * 1024 * 1024, // 2 MiB
                storage_backend: "kv",
            },
            Platform::Local => PlatformDefaults {
                max_upload_bytes: 2 * 1024 * 1024, // 2 MiB
                storage_backend: "fs",
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlatformDefaults {
    pub max_upload_bytes: usize,
    pub storage_backend: &'static str,
}
