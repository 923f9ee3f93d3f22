//! Request and response values exchanged between pages, the worker and the network.
//!
//! These are plain owned values so they can be stored, cloned into background
//! tasks and compared in tests without any browser or HTTP client types.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// Body of the response synthesized when neither network nor cache can answer.
pub const OFFLINE_BODY: &str = "<!doctype html>\
<html lang=\"es\"><head><meta charset=\"utf-8\"><title>SOID - Sin conexión</title></head>\
<body><h1>Sin conexión</h1>\
<p>Estás offline. Revisa tu conexión a internet e inténtalo de nuevo.</p></body></html>";

/// An outgoing page request as seen by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute request URL.
    pub url: Url,
    /// Header map keyed by lower-case header name.
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// Build a request with the given method and no headers.
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.trim().to_ascii_uppercase(), url, headers: BTreeMap::new() }
    }

    /// Build a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Set the `Accept` header.
    pub fn with_accept(self, accept: &str) -> Self {
        self.with_header("accept", accept)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn accept(&self) -> Option<&str> {
        self.header("accept")
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Key under which this request is stored in the cache.
    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

/// A captured or synthesized response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Header map keyed by lower-case header name.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: BTreeMap::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Empty 404 used when an asset is neither cached nor reachable.
    pub fn not_found() -> Self {
        Self::new(404, Bytes::new())
    }

    /// Minimal offline page returned when nothing else is available.
    pub fn offline_html() -> Self {
        Self::new(200, Bytes::from_static(OFFLINE_BODY.as_bytes()))
            .with_header("content-type", "text/html; charset=utf-8")
    }
}
