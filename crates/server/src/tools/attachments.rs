//! Attachment tools for financial movements.
//!
//! - `attachment_list`: attachments of a movement
//! - `attachment_upload`: upload a local file (max 10MB)
//! - `attachment_delete`: delete an attachment

use std::path::Path;

use bytes::Bytes;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use soid_client::api::{
    ApiError, Attachment, MAX_ATTACHMENT_BYTES, SoidApi, format_file_size, icon_for_extension, truncate_name,
};
use soid_core::Error;

use super::json_result;
use crate::error::ToolError;

/// Display names are cut to this many characters.
const NAME_DISPLAY_CHARS: usize = 30;

/// An attachment with its display name.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    #[serde(flatten)]
    pub attachment: Attachment,
    pub nombre_corto: String,
}

impl From<Attachment> for AttachmentView {
    fn from(attachment: Attachment) -> Self {
        Self { nombre_corto: truncate_name(&attachment.nombre, NAME_DISPLAY_CHARS), attachment }
    }
}

/// Input parameters for attachment_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttachmentListParams {
    /// Financial movement id.
    pub movement_id: i64,
}

/// Output structure for attachment_list tool.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentListOutput {
    pub movement_id: i64,
    pub attachments: Vec<AttachmentView>,
}

/// Implementation of the attachment_list tool.
pub async fn list_impl(api: &SoidApi, params: AttachmentListParams) -> Result<CallToolResult, McpError> {
    let attachments = api.list_attachments(params.movement_id).await.map_err(Error::from)?;
    json_result(&AttachmentListOutput {
        movement_id: params.movement_id,
        attachments: attachments.into_iter().map(AttachmentView::from).collect(),
    })
}

/// Input parameters for attachment_upload tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttachmentUploadParams {
    /// Financial movement id.
    pub movement_id: i64,

    /// Local path of the file to upload.
    pub path: String,

    /// Name to upload the file under (default: the file's own name).
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Output structure for attachment_upload tool.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentUploadOutput {
    pub attachment: AttachmentView,
    /// Size of the uploaded file, e.g. `1.5 MB`.
    pub size: String,
    /// Material icon for the local file name.
    pub icon: String,
}

/// Implementation of the attachment_upload tool.
///
/// The size limit is checked against file metadata before reading it.
pub async fn upload_impl(api: &SoidApi, params: AttachmentUploadParams) -> Result<CallToolResult, McpError> {
    let path = Path::new(&params.path);
    let file_name = match params.file_name.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| ToolError::InvalidInput(format!("no file name in path {}", params.path)))?,
    };

    let file_error = |e: std::io::Error| ToolError::File { path: params.path.clone(), reason: e.to_string() };
    let metadata = tokio::fs::metadata(path).await.map_err(file_error)?;
    if metadata.len() > MAX_ATTACHMENT_BYTES {
        let err = ApiError::FileTooLarge { name: file_name, size: format_file_size(metadata.len()) };
        return Err(Error::from(err).into());
    }
    let content = tokio::fs::read(path).await.map_err(file_error)?;
    let size = format_file_size(content.len() as u64);

    let attachment = api
        .upload_attachment(params.movement_id, &file_name, Bytes::from(content))
        .await
        .map_err(Error::from)?;

    tracing::info!(movement = params.movement_id, file = %file_name, %size, "attachment uploaded");
    json_result(&AttachmentUploadOutput {
        attachment: attachment.into(),
        size,
        icon: icon_for_extension(&file_name).to_string(),
    })
}

/// Input parameters for attachment_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttachmentDeleteParams {
    pub attachment_id: i64,
}

/// Output structure for attachment_delete tool.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentDeleteOutput {
    pub attachment_id: i64,
    pub mensaje: String,
}

/// Implementation of the attachment_delete tool.
pub async fn delete_impl(api: &SoidApi, params: AttachmentDeleteParams) -> Result<CallToolResult, McpError> {
    let mensaje = api.delete_attachment(params.attachment_id).await.map_err(Error::from)?;
    json_result(&AttachmentDeleteOutput { attachment_id: params.attachment_id, mensaje })
}
