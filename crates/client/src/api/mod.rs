//! Client for the SOID companion HTTP API.
//!
//! The web app exposes a few JSON endpoints that its pages call directly:
//! member autocomplete and the attachments of a financial movement.
//!
//! ### Envelope
//!
//! Every response is a JSON object with a `success` flag. `success: false`
//! carries the reason in `error` (or `mensaje`) and becomes
//! [`ApiError::Rejected`].
//!
//! ### Session
//!
//! Calls carry the configured Django session cookie. Redirects are not
//! followed: an unauthenticated call is redirected to the login page, which
//! maps to [`ApiError::AuthError`].

pub mod attachments;
pub mod error;
pub mod members;

pub use attachments::{Attachment, MAX_ATTACHMENT_BYTES, format_file_size, icon_for_extension, truncate_name};
pub use error::ApiError;
pub use members::{MIN_QUERY_CHARS, Member, MemberQuery, initials};

use std::time::Duration;

use reqwest::{Method, header};
use serde_json::Value;
use url::Url;

use soid_core::AppConfig;

use crate::fetch::resolve;

/// Companion API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin of the web app; endpoint paths are resolved against it.
    pub origin: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub csrf_token: Option<String>,
    pub session_cookie: Option<String>,
    pub member_search_endpoint: String,
    pub member_filter: String,
    pub member_limit: u32,
}

impl ApiConfig {
    /// Build from the application configuration.
    pub fn from_app(config: &AppConfig) -> Result<Self, ApiError> {
        let origin = config.origin_url().map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        Ok(Self {
            origin,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            csrf_token: config.csrf_token.clone(),
            session_cookie: config.session_cookie.clone(),
            member_search_endpoint: config.member_search_endpoint.clone(),
            member_filter: config.member_filter.clone(),
            member_limit: config.member_limit,
        })
    }
}

/// Companion API client.
#[derive(Debug, Clone)]
pub struct SoidApi {
    http: reqwest::Client,
    config: ApiConfig,
}

impl SoidApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn csrf_token(&self) -> Result<&str, ApiError> {
        self.config.csrf_token.as_deref().ok_or(ApiError::MissingCsrfToken)
    }

    /// Cookie header for the configured session, with the CSRF cookie Django
    /// checks against the `X-CSRFToken` header.
    fn cookie_header(&self) -> Option<String> {
        let mut cookies = Vec::new();
        if let Some(session) = &self.config.session_cookie {
            cookies.push(format!("sessionid={session}"));
        }
        if let Some(csrf) = &self.config.csrf_token {
            cookies.push(format!("csrftoken={csrf}"));
        }
        (!cookies.is_empty()).then(|| cookies.join("; "))
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = resolve(&self.config.origin, path).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let mut builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }
        Ok(builder)
    }

    /// Send a request and open the response envelope.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("companion API {} -> {}", response.url().path(), status);

        if status == 401 || status == 403 || status.is_redirection() {
            return Err(ApiError::AuthError);
        }

        let bytes = response.bytes().await?;
        match open_envelope(&bytes) {
            Ok(value) if status.is_success() => Ok(value),
            Ok(_) | Err(ApiError::Parse(_)) if !status.is_success() => {
                Err(ApiError::HttpError { status: status.as_u16() })
            }
            other => other,
        }
    }
}

/// Check the `success` flag and return the whole body.
pub(crate) fn open_envelope(bytes: &[u8]) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| ApiError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::Parse("expected a JSON object".into()));
    }
    if value.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(value);
    }

    let reason = value
        .get("error")
        .or_else(|| value.get("mensaje"))
        .and_then(Value::as_str)
        .unwrap_or("request rejected");
    Err(ApiError::Rejected(reason.to_string()))
}
