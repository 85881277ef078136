//! Configuration validation.
//!
//! Validates configuration values after they have been loaded from
//! environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` is blank
    /// - `origin` is not an http(s) origin
    /// - any configured path does not start with `/`
    /// - `offline_document` is not part of `app_shell`
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        self.origin_url()?;

        if self.app_shell.is_empty() {
            return Err(invalid("app_shell", "must list at least one path"));
        }
        if let Some(path) = self.app_shell.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "app_shell".into(),
                reason: format!("path must start with '/': {path}"),
            });
        }

        if !self.offline_document.starts_with('/') {
            return Err(invalid("offline_document", "must start with '/'"));
        }
        if !self.app_shell.contains(&self.offline_document) {
            return Err(invalid("offline_document", "must be listed in app_shell so install seeds it"));
        }

        if !self.worker_script.starts_with('/') {
            return Err(invalid("worker_script", "must start with '/'"));
        }
        if self.reserved_prefixes.iter().any(|p| !p.starts_with('/')) {
            return Err(invalid("reserved_prefixes", "every prefix must start with '/'"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.push_host.is_empty() {
            tracing::warn!("push_host is empty; push provider hosts will not be excluded from caching");
        }

        Ok(())
    }
}
