//! Request classification.
//!
//! Checks run in a fixed order (method, excluded prefix, HTML, static
//! extension), so exactly one policy applies to any request.

use serde::{Deserialize, Serialize};

use crate::http::Request;

/// How the worker handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoutePolicy {
    /// Not intercepted; the host's default network handling applies.
    Bypass,
    /// Fresh network response preferred, cache on failure.
    NetworkFirst,
    /// Cached copy served immediately while the network refreshes it.
    CacheFirstRefresh,
    /// Forwarded to the network, never cached.
    NetworkOnly,
}

impl std::fmt::Display for RoutePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoutePolicy::Bypass => "bypass",
            RoutePolicy::NetworkFirst => "network_first",
            RoutePolicy::CacheFirstRefresh => "cache_first_refresh",
            RoutePolicy::NetworkOnly => "network_only",
        };
        f.write_str(name)
    }
}

/// Path prefixes and asset extensions that drive classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRules {
    excluded_prefixes: Vec<String>,
    /// Lower-case, without the leading dot.
    static_extensions: Vec<String>,
}

impl RouteRules {
    pub fn new(excluded_prefixes: Vec<String>, static_extensions: Vec<String>) -> Self {
        let static_extensions = static_extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self { excluded_prefixes, static_extensions }
    }

    /// True if `path` must never touch the cache.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// True if the last path segment carries a static-asset extension.
    pub fn is_static_asset(&self, path: &str) -> bool {
        let segment = path.rsplit('/').next().unwrap_or_default();
        match segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.static_extensions.iter().any(|known| *known == ext)
            }
            _ => false,
        }
    }

    /// Assign a policy from method, path and `Accept` header.
    pub fn classify(&self, method: &str, path: &str, accept: Option<&str>) -> RoutePolicy {
        if !method.eq_ignore_ascii_case("GET") {
            return RoutePolicy::Bypass;
        }
        if self.is_excluded(path) {
            return RoutePolicy::Bypass;
        }
        if accept.is_some_and(|value| value.to_ascii_lowercase().contains("text/html")) {
            return RoutePolicy::NetworkFirst;
        }
        if self.is_static_asset(path) {
            return RoutePolicy::CacheFirstRefresh;
        }
        RoutePolicy::NetworkOnly
    }

    pub fn classify_request(&self, request: &Request) -> RoutePolicy {
        self.classify(&request.method, request.path(), request.accept())
    }
}

impl Default for RouteRules {
    fn default() -> Self {
        let prefixes = ["/admin", "/accounts", "/api", "/notificaciones", "/push", "/sw.js", "/manifest.json"];
        let extensions = ["css", "js", "png", "jpg", "jpeg", "svg", "woff2", "woff", "ico", "webp"];
        Self::new(
            prefixes.into_iter().map(String::from).collect(),
            extensions.into_iter().map(String::from).collect(),
        )
    }
}
