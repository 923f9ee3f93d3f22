//! Member autocomplete search.

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{ApiError, SoidApi};

/// Minimum trimmed query length that triggers a search.
pub const MIN_QUERY_CHARS: usize = 2;

/// Placeholder the server sends for empty fields.
const EMPTY_FIELD: &str = "—";

/// Member search parameters. Unset fields use the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    pub q: String,
    /// `activos`, `bautizados` or `todos`.
    pub filtro: Option<String>,
    pub limit: Option<u32>,
}

/// One autocomplete result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub nombre: String,
    #[serde(default, deserialize_with = "text_or_placeholder")]
    pub codigo: Option<String>,
    #[serde(default, deserialize_with = "text_or_placeholder")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "number_or_placeholder")]
    pub edad: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    resultados: Vec<Member>,
}

fn text_or_placeholder<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| {
        let s = s.trim();
        !s.is_empty() && s != EMPTY_FIELD
    }))
}

fn number_or_placeholder<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Two-letter avatar initials for a member name.
///
/// First letters of the first two words, or the first two letters of a
/// single word; `?` for a blank name.
pub fn initials(nombre: &str) -> String {
    let mut words = nombre.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => "?".to_string(),
        (Some(first), Some(second)) => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect(),
        (Some(only), None) => only.chars().take(2).flat_map(char::to_uppercase).collect(),
    }
}

impl SoidApi {
    /// Search members for autocomplete.
    ///
    /// Queries shorter than [`MIN_QUERY_CHARS`] after trimming return no
    /// results without calling the server.
    pub async fn search_members(&self, query: &MemberQuery) -> Result<Vec<Member>, ApiError> {
        let q = query.q.trim();
        if q.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        let filtro = query.filtro.as_deref().unwrap_or(&self.config.member_filter);
        let limit = query.limit.unwrap_or(self.config.member_limit).to_string();

        tracing::debug!("searching members: q={} filtro={} limit={}", q, filtro, limit);

        let builder = self
            .request(Method::GET, &self.config.member_search_endpoint)?
            .query(&[("q", q), ("filtro", filtro), ("limit", limit.as_str())]);
        let body: SearchBody =
            serde_json::from_value(self.send(builder).await?).map_err(|e| ApiError::Parse(e.to_string()))?;

        Ok(body.resultados)
    }
}
