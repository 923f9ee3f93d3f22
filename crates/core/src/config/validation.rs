//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn require_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with('/') { Ok(()) } else { Err(invalid(field, format!("'{value}' must start with '/'"))) }
}

impl AppConfig {
    /// The excluded prefix a path starts with, matched as the router does.
    fn excluded_prefix_of(&self, path: &str) -> Option<&str> {
        self.excluded_prefixes.iter().map(String::as_str).find(|prefix| path.starts_with(prefix))
    }

    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` or `user_agent` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - a pre-cache path, `offline_path` or excluded prefix does not start with `/`
    /// - `offline_path` is not pre-cached
    /// - `offline_path` or a pre-cache path falls under an excluded prefix
    /// - `timeout_ms` is outside 100ms..=5min, `max_bytes` outside 1..=50MB
    /// - `member_limit` is outside 1..=100
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }

        for path in &self.precache_urls {
            require_path("precache_urls", path)?;
        }
        for prefix in &self.excluded_prefixes {
            require_path("excluded_prefixes", prefix)?;
        }
        require_path("offline_path", &self.offline_path)?;
        if !self.precache_urls.contains(&self.offline_path) {
            return Err(invalid("offline_path", "must be listed in precache_urls"));
        }
        if let Some(prefix) = self.excluded_prefix_of(&self.offline_path) {
            let reason = format!("'{}' falls under excluded prefix '{prefix}'", self.offline_path);
            return Err(invalid("offline_path", reason));
        }
        for path in &self.precache_urls {
            if let Some(prefix) = self.excluded_prefix_of(path) {
                return Err(invalid("precache_urls", format!("'{path}' falls under excluded prefix '{prefix}'")));
            }
        }

        if self.static_extensions.iter().any(|ext| ext.is_empty() || ext.starts_with('.')) {
            return Err(invalid("static_extensions", "entries are bare extensions like 'css'"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.member_limit == 0 || self.member_limit > 100 {
            return Err(invalid("member_limit", "must be between 1 and 100"));
        }

        if !self.badge_supported {
            tracing::debug!("app badges disabled; badge updates will be skipped");
        }

        Ok(())
    }
}
