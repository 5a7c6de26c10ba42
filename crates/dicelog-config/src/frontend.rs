// Frontend base URL resolution and normalization
//
// The frontend URL builds retrieval links and the CORS allow-origin
// header. It is required configuration; the missing-value diagnostic is
// bilingual because the deployments this serves are.

use anyhow::{bail, Result};
use std::fmt;

pub const FRONTEND_URL_MISSING: &str = "未配置前端地址参数 FRONTEND_URL ，请设置运行时的变量 FRONTEND_URL。FRONTEND_URL is not configured. Please set runtime variable FRONTEND_URL.";

/// Normalized frontend base URL.
///
/// Invariant: the inner string carries a scheme and exactly one trailing
/// slash, so `{url}?key=...` link building never produces a double slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendUrl(String);

impl FrontendUrl {
    /// Normalize a raw configured value:
    /// - prefix `https://` when no `http://`/`https://` scheme is given
    /// - collapse any run of trailing slashes to exactly one
    pub fn resolve(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("{}", FRONTEND_URL_MISSING);
        }

        let lower = trimmed.to_ascii_lowercase();
        let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        Ok(Self(format!("{}/", with_scheme.trim_end_matches('/'))))
    }

    /// The base URL, with its trailing slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The CORS allow-origin value: the base URL minus the trailing slash.
    pub fn origin(&self) -> &str {
        self.0.trim_end_matches('/')
    }
}

impl fmt::Display for FrontendUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_added_when_missing() {
        let url = FrontendUrl::resolve("logs.example.com").unwrap();
        assert_eq!(url.as_str(), "https://logs.example.com/");
    }

    #[test]
    fn test_existing_scheme_is_kept() {
        let url = FrontendUrl::resolve("http://localhost:3000").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/");

        let url = FrontendUrl::resolve("HTTPS://Logs.Example.Com").unwrap();
        assert_eq!(url.as_str(), "HTTPS://Logs.Example.Com/");
    }

    #[test]
    fn test_trailing_slashes_collapse_to_one() {
        let url = FrontendUrl::resolve("https://logs.example.com///").unwrap();
        assert_eq!(url.as_str(), "https://logs.example.com/");
    }

    #[test]
    fn test_origin_strips_the_slash() {
        let url = FrontendUrl::resolve("logs.example.com/").unwrap();
        assert_eq!(url.origin(), "https://logs.example.com");
    }

    #[test]
    fn test_missing_value_is_a_bilingual_error() {
        let err = FrontendUrl::resolve("   ").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("FRONTEND_URL is not configured"));
        assert!(msg.contains("未配置前端地址参数"));
    }
}
