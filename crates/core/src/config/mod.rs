//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache store.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Serving origin; requests to any other origin bypass the cache.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the current cache generation.
    ///
    /// Bump whenever `app_shell` or the caching policy changes; every other
    /// store name is deleted on activate.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Paths fetched and stored at install time.
    #[serde(default = "default_app_shell")]
    pub app_shell: Vec<String>,

    /// Path served when a navigation cannot reach the network.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Path of this router's own worker script. Never cached.
    #[serde(default = "default_worker_script")]
    pub worker_script: String,

    /// Hostname substring of the push-notification provider. Never cached.
    #[serde(default = "default_push_host")]
    pub push_host: String,

    /// Path prefixes reserved for the push provider's worker scripts.
    #[serde(default = "default_reserved_prefixes")]
    pub reserved_prefixes: Vec<String>,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest response body stored on a static miss.
    ///
    /// Larger responses are still returned, just not stored.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Store only 2xx responses on a static miss.
    ///
    /// Off by default, which stores whatever the network returned.
    #[serde(default)]
    pub store_success_only: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_version() -> String {
    "shell-v1".into()
}

fn default_app_shell() -> Vec<String> {
    ["/", "/manifest.json", "/icons/icon-192.png", "/icons/icon-512.png", "/logo.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_offline_document() -> String {
    "/".into()
}

fn default_worker_script() -> String {
    "/sw.js".into()
}

fn default_push_host() -> String {
    "onesignal.com".into()
}

fn default_reserved_prefixes() -> Vec<String> {
    vec!["/OneSignalSDKWorker".into(), "/OneSignalSDKUpdaterWorker".into()]
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            app_shell: default_app_shell(),
            offline_document: default_offline_document(),
            worker_script: default_worker_script(),
            push_host: default_push_host(),
            reserved_prefixes: default_reserved_prefixes(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            store_success_only: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Serving origin parsed as a URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let parsed = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
            _ => Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) origin".into() }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
