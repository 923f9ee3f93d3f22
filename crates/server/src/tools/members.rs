//! member_search tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use soid_client::api::{MIN_QUERY_CHARS, Member, MemberQuery, SoidApi, initials};

use super::json_result;

/// Input parameters for member_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MemberSearchParams {
    /// Name, surname, member code or ID number (at least 2 characters).
    pub q: String,

    /// `activos` (default), `bautizados` or `todos`.
    #[serde(default)]
    pub filtro: Option<String>,

    /// Maximum results (default: 15).
    #[serde(default)]
    pub limit: Option<u32>,
}

/// A member with its avatar initials.
#[derive(Debug, Clone, Serialize)]
pub struct MemberHit {
    #[serde(flatten)]
    pub member: Member,
    pub iniciales: String,
}

/// Output structure for member_search tool.
#[derive(Debug, Clone, Serialize)]
pub struct MemberSearchOutput {
    pub query: String,
    /// False when the query was too short to search.
    pub searched: bool,
    pub results: Vec<MemberHit>,
}

/// Implementation of the member_search tool.
pub async fn search_impl(api: &SoidApi, params: MemberSearchParams) -> Result<CallToolResult, McpError> {
    let query = MemberQuery { q: params.q.trim().to_string(), filtro: params.filtro, limit: params.limit };
    let searched = query.q.chars().count() >= MIN_QUERY_CHARS;

    let results = api
        .search_members(&query)
        .await
        .map_err(soid_core::Error::from)?
        .into_iter()
        .map(|member| MemberHit { iniciales: initials(&member.nombre), member })
        .collect();

    json_result(&MemberSearchOutput { query: query.q, searched, results })
}
