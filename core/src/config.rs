//! Adapter configuration.
//!
//! Sourced from the environment:
//!
//! | Variable                 | Meaning                                        |
//! |--------------------------|------------------------------------------------|
//! | `GRADER_ENV`             | `development` routes through the dev proxy     |
//! | `GRADER_DEV_ORIGIN`      | Origin of the dev proxy (`http://127.0.0.1:5173`) |
//! | `GRADER_LEGACY_API_URL`  | Legacy backend base URL outside development    |
//! | `GRADER_API_URL`         | Normalized API base (`/api/v3`)                |
//! | `GRADER_CACHE_TTL_SECS`  | GET cache freshness window (300)               |
//! | `GRADER_TOKEN_STORE`     | JSON file persisting the bearer token (unset: in memory) |

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;

pub const DEV_PROXY_PATH: &str = "/api/legacy";
pub const DEFAULT_DEV_ORIGIN: &str = "http://127.0.0.1:5173";
pub const DEFAULT_V3_BASE_URL: &str = "/api/v3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub legacy_base_url: String,
    pub v3_base_url: String,
    pub cache_ttl: Duration,
    pub development: bool,
    pub token_store: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl AdapterConfig {
    /// Configuration pointing at an explicit legacy base URL.
    pub fn new(legacy_base_url: &str) -> Self {
        Self {
            legacy_base_url: legacy_base_url.to_string(),
            v3_base_url: DEFAULT_V3_BASE_URL.to_string(),
            cache_ttl: DEFAULT_TTL,
            development: false,
            token_store: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source and validate the result.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let development = lookup("GRADER_ENV").is_some_and(|env| env == "development");

        let legacy_base_url = if development {
            let origin = lookup("GRADER_DEV_ORIGIN").unwrap_or_else(|| DEFAULT_DEV_ORIGIN.to_string());
            format!("{}{DEV_PROXY_PATH}", origin.trim_end_matches('/'))
        } else {
            lookup("GRADER_LEGACY_API_URL").unwrap_or_default()
        };

        let v3_base_url =
            lookup("GRADER_API_URL").unwrap_or_else(|| DEFAULT_V3_BASE_URL.to_string());

        let cache_ttl = match lookup("GRADER_CACHE_TTL_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    field: "GRADER_CACHE_TTL_SECS",
                    reason: e.to_string(),
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_TTL,
        };

        let token_store = lookup("GRADER_TOKEN_STORE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            legacy_base_url,
            v3_base_url,
            cache_ttl,
            development,
            token_store,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.legacy_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "legacy_base_url",
                reason: "must not be empty (set GRADER_LEGACY_API_URL)".to_string(),
            });
        }
        if self.v3_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "v3_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
