//! Attachments of a financial movement.
//!
//! - List: `GET /finanzas/adjuntos/movimiento/<id>/listar/`
//! - Upload: `POST /finanzas/adjuntos/movimiento/<id>/subir/`, multipart field `archivo`
//! - Delete: `POST /finanzas/adjuntos/<id>/eliminar/`
//!
//! Upload and delete send `X-CSRFToken`.

use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{ApiError, SoidApi};

/// Largest file accepted for upload.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Attachment as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub nombre: String,
    pub url_descarga: String,
    #[serde(default)]
    pub url_imagen: Option<String>,
    #[serde(default)]
    pub es_imagen: bool,
    /// Material icon name.
    #[serde(default)]
    pub icono: String,
    /// Human-readable size, formatted by the server.
    #[serde(rename = "tamaño", default)]
    pub tamano: String,
    #[serde(default)]
    pub puede_eliminar: bool,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    #[serde(default)]
    adjuntos: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    adjunto: Attachment,
}

#[derive(Debug, Deserialize)]
struct DeleteBody {
    #[serde(default)]
    mensaje: Option<String>,
}

/// Material icon name for a file, by extension.
pub fn icon_for_extension(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "pdf" => "picture_as_pdf",
        "doc" | "docx" => "description",
        "xls" | "xlsx" => "table_chart",
        "jpg" | "jpeg" | "png" | "gif" => "image",
        _ => "insert_drive_file",
    }
}

/// Human file size: `B` below 1 KB, otherwise `KB` or `MB` with one decimal.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    match bytes {
        b if b < KB => format!("{b} B"),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{:.1} MB", b as f64 / MB as f64),
    }
}

/// Shorten a file name to `max_len` characters, ending in `...`.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn check_upload(file_name: &str, size: u64) -> Result<(), ApiError> {
    if file_name.trim().is_empty() {
        return Err(ApiError::InvalidInput("file name must not be empty".into()));
    }
    if size > MAX_ATTACHMENT_BYTES {
        return Err(ApiError::FileTooLarge { name: file_name.to_string(), size: format_file_size(size) });
    }
    Ok(())
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

impl SoidApi {
    /// List the attachments of a movement.
    pub async fn list_attachments(&self, movement_id: i64) -> Result<Vec<Attachment>, ApiError> {
        let path = format!("/finanzas/adjuntos/movimiento/{movement_id}/listar/");
        let body: ListBody = decode(self.send(self.request(Method::GET, &path)?).await?)?;
        Ok(body.adjuntos)
    }

    /// Upload one file to a movement.
    ///
    /// Files over [`MAX_ATTACHMENT_BYTES`] are rejected before any request.
    pub async fn upload_attachment(
        &self, movement_id: i64, file_name: &str, content: Bytes,
    ) -> Result<Attachment, ApiError> {
        check_upload(file_name, content.len() as u64)?;
        let csrf = self.csrf_token()?;

        tracing::debug!(
            "uploading {} ({}) to movement {}",
            file_name,
            format_file_size(content.len() as u64),
            movement_id
        );

        let part = Part::bytes(content.to_vec()).file_name(file_name.to_string());
        let form = Form::new().part("archivo", part);
        let path = format!("/finanzas/adjuntos/movimiento/{movement_id}/subir/");
        let builder = self
            .request(Method::POST, &path)?
            .header("X-CSRFToken", csrf)
            .multipart(form);

        let body: UploadBody = decode(self.send(builder).await?)?;
        Ok(body.adjunto)
    }

    /// Delete an attachment; returns the server's confirmation message.
    pub async fn delete_attachment(&self, attachment_id: i64) -> Result<String, ApiError> {
        let csrf = self.csrf_token()?;
        let path = format!("/finanzas/adjuntos/{attachment_id}/eliminar/");
        let builder = self.request(Method::POST, &path)?.header("X-CSRFToken", csrf);

        let body: DeleteBody = decode(self.send(builder).await?)?;
        Ok(body.mensaje.unwrap_or_else(|| format!("attachment {attachment_id} deleted")))
    }
}
