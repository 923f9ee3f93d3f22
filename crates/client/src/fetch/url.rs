//! URL handling for the origin and the paths resolved against it.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for soid_core::Error {
    fn from(err: UrlError) -> Self {
        soid_core::Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize an origin or page URL.
///
/// Trims whitespace, defaults a missing scheme to `https://`, lowercases the
/// host and drops the fragment. The query string is kept as given.
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let raw = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut parsed = Url::parse(&raw).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a site path (`/finanzas/...`) or absolute URL against `origin`.
///
/// Absolute targets go through [`canonicalize`]; anything else is joined onto
/// the origin.
pub fn resolve(origin: &Url, target: &str) -> Result<Url, UrlError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    if trimmed.contains("://") {
        return canonicalize(trimmed);
    }

    let mut joined = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    joined.set_fragment(None);
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://soid.example/").unwrap()
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("soid.example").unwrap();
        assert_eq!(url.as_str(), "https://soid.example/");
    }

    #[test]
    fn test_canonicalize_lowercase_host_and_fragment() {
        let url = canonicalize("  https://SOID.Example/miembros/#lista ").unwrap();
        assert_eq!(url.as_str(), "https://soid.example/miembros/");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("http://localhost:8000/api/buscar-miembros/?q=ana&limit=5").unwrap();
        assert_eq!(url.query(), Some("q=ana&limit=5"));
        assert_eq!(url.port(), Some(8000));
    }

    #[test]
    fn test_canonicalize_rejects() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("https://"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_resolve_path() {
        let url = resolve(&origin(), "/finanzas/adjuntos/7/eliminar/").unwrap();
        assert_eq!(url.as_str(), "https://soid.example/finanzas/adjuntos/7/eliminar/");
    }

    #[test]
    fn test_resolve_strips_fragment() {
        let url = resolve(&origin(), "/notificaciones/#ultima").unwrap();
        assert_eq!(url.as_str(), "https://soid.example/notificaciones/");
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve(&origin(), "https://CDN.example/app.js").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/app.js");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
    }

    #[test]
    fn test_url_error_into_core() {
        let err: soid_core::Error = UrlError::Empty.into();
        assert!(matches!(err, soid_core::Error::InvalidUrl(_)));
    }
}
