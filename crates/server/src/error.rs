//! Tool-level errors for the soid-sw server.
//!
//! Worker, cache and API failures arrive as `soid_core::Error`; these cover
//! what only the tool surface can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid tool parameters (e.g., an empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A local file named in the parameters could not be read.
    #[error("FILE_ERROR: {path}: {reason}")]
    File { path: String, reason: String },
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::File { .. } => -32011,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
