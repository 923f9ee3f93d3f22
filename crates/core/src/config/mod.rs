//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SOID_SW_*)
//! 2. TOML config file (if SOID_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::worker::{NotificationDefaults, RouteRules, WorkerConfig};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SOID_SW_*)
/// 2. TOML config file (if SOID_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via SOID_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker is installed on; relative paths resolve against it.
    ///
    /// Set via SOID_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Identifier of the cache version this build writes to.
    ///
    /// Set via SOID_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Paths fetched into the cache during install.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Page served when an HTML request fails and has no cached copy.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// Path prefixes that are never intercepted or cached.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// File extensions (without the dot) served cache-first.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Activate right after install instead of waiting for SKIP_WAITING.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// Whether the host exposes app-icon badges.
    #[serde(default = "default_true")]
    pub badge_supported: bool,

    /// Icon and badge image shown with notifications.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    /// Vibration pattern in milliseconds.
    #[serde(default = "default_vibrate_pattern")]
    pub vibrate_pattern: Vec<u32>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SOID_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SOID_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to read per response.
    ///
    /// Set via SOID_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Member search endpoint path.
    #[serde(default = "default_member_search_endpoint")]
    pub member_search_endpoint: String,

    /// Default `filtro` sent with member searches.
    #[serde(default = "default_member_filter")]
    pub member_filter: String,

    /// Default result limit for member searches.
    #[serde(default = "default_member_limit")]
    pub member_limit: u32,

    /// CSRF token for state-changing API calls.
    ///
    /// Set via SOID_SW_CSRF_TOKEN environment variable.
    /// Required only when uploading or deleting attachments.
    #[serde(default)]
    pub csrf_token: Option<String>,

    /// Session cookie value sent with API calls.
    ///
    /// Set via SOID_SW_SESSION_COOKIE environment variable.
    #[serde(default)]
    pub session_cookie: Option<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./soid-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8000".into()
}

fn default_cache_version() -> String {
    "soid-tf-cache-v5".into()
}

fn default_precache_urls() -> Vec<String> {
    vec!["/".into(), "/offline/".into()]
}

fn default_offline_path() -> String {
    "/offline/".into()
}

fn default_excluded_prefixes() -> Vec<String> {
    ["/admin", "/accounts", "/api", "/notificaciones", "/push", "/sw.js", "/manifest.json"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_static_extensions() -> Vec<String> {
    ["css", "js", "png", "jpg", "jpeg", "svg", "woff2", "woff", "ico", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_notification_icon() -> String {
    "/static/core/icons/icon-192.png".into()
}

fn default_vibrate_pattern() -> Vec<u32> {
    vec![100, 50, 100]
}

fn default_user_agent() -> String {
    "soid-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_member_search_endpoint() -> String {
    "/api/buscar-miembros/".into()
}

fn default_member_filter() -> String {
    "activos".into()
}

fn default_member_limit() -> u32 {
    15
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            precache_urls: default_precache_urls(),
            offline_path: default_offline_path(),
            excluded_prefixes: default_excluded_prefixes(),
            static_extensions: default_static_extensions(),
            skip_waiting_on_install: true,
            badge_supported: true,
            notification_icon: default_notification_icon(),
            vibrate_pattern: default_vibrate_pattern(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            member_search_endpoint: default_member_search_endpoint(),
            member_filter: default_member_filter(),
            member_limit: default_member_limit(),
            csrf_token: None,
            session_cookie: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be read
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SOID_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SOID_SW_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Build the immutable worker configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin cannot be parsed.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        Ok(WorkerConfig {
            cache_version: self.cache_version.clone(),
            origin: self.origin_url()?,
            precache_urls: self.precache_urls.clone(),
            offline_path: self.offline_path.clone(),
            routes: RouteRules::new(self.excluded_prefixes.clone(), self.static_extensions.clone()),
            skip_waiting_on_install: self.skip_waiting_on_install,
            notifications: NotificationDefaults {
                icon: self.notification_icon.clone(),
                vibrate: self.vibrate_pattern.clone(),
                ..NotificationDefaults::default()
            },
        })
    }

    /// Check the CSRF token is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no CSRF token is configured.
    pub fn require_csrf_token(&self) -> Result<&str, ConfigError> {
        self.csrf_token.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "csrf_token".into(),
            hint: "Set SOID_SW_CSRF_TOKEN environment variable".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./soid-sw-cache.sqlite"));
        assert_eq!(config.cache_version, "soid-tf-cache-v5");
        assert_eq!(config.precache_urls, vec!["/", "/offline/"]);
        assert_eq!(config.offline_path, "/offline/");
        assert_eq!(config.static_extensions.len(), 10);
        assert!(config.excluded_prefixes.contains(&"/sw.js".to_string()));
        assert!(config.skip_waiting_on_install);
        assert_eq!(config.member_limit, 15);
        assert!(config.csrf_token.is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_worker_config_from_defaults() {
        let worker = AppConfig::default().worker_config().unwrap();
        assert_eq!(worker.cache_version, "soid-tf-cache-v5");
        assert_eq!(worker.origin.as_str(), "http://localhost:8000/");
        assert_eq!(worker.notifications.icon, "/static/core/icons/icon-192.png");
        assert_eq!(worker.notifications.vibrate, vec![100, 50, 100]);
    }

    #[test]
    fn test_worker_config_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(config.worker_config(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_require_csrf_token_missing() {
        let config = AppConfig::default();
        let result = config.require_csrf_token();
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_csrf_token_present() {
        let config = AppConfig { csrf_token: Some("tok".into()), ..Default::default() };
        assert_eq!(config.require_csrf_token().unwrap(), "tok");
    }
}
