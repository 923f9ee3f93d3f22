//! MCP tool implementations.
//!
//! This module contains all tools exposed by the soid-sw server. Every tool
//! answers with one pretty-printed JSON text block.

pub mod attachments;
pub mod cache;
pub mod members;
pub mod pages;
pub mod push;
pub mod worker;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use soid_core::Error;

/// Serialize a tool output as the single content block of a result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Body as text when it is valid UTF-8.
pub(crate) fn body_text(body: &[u8]) -> Option<String> {
    std::str::from_utf8(body).ok().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_text() {
        assert_eq!(body_text(b"hola").as_deref(), Some("hola"));
        assert_eq!(body_text(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_json_result_single_block() {
        let result = json_result(&serde_json::json!({"ok": true})).unwrap();
        assert_eq!(result.content.len(), 1);
        assert!(!result.is_error.unwrap_or(false));
    }
}
