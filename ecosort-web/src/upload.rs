//! Upload validation and staging
//!
//! The `image` multipart field is streamed into a temporary file in the upload
//! directory. The file lives exactly as long as its [`StagedUpload`] and is
//! removed when the request finishes, whatever the outcome.

use crate::error::{ApiError, ApiResult};
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Formats the vision service accepts
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Where and how large uploads may be
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// An upload written to a temporary file
#[derive(Debug)]
pub struct StagedUpload {
    file_name: String,
    file: NamedTempFile,
    size: u64,
}

impl StagedUpload {
    /// Sanitized client file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the staged image back into memory
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }
}

/// Reduce a client-supplied file name to a safe basename
///
/// Keeps ASCII alphanumerics, `.`, `_` and `-`; whitespace becomes `_`; any
/// directory part and leading dots are dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Lower-cased extension when it is one of [`ALLOWED_EXTENSIONS`]
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Validate the client file name; returns (sanitized name, extension)
pub fn validate_file_name(file_name: Option<&str>) -> ApiResult<(String, String)> {
    let raw = file_name.unwrap_or("");
    if raw.trim().is_empty() {
        return Err(ApiError::BadRequest("Empty file name".to_string()));
    }

    let sanitized = sanitize_file_name(raw);
    if sanitized.is_empty() {
        return Err(ApiError::BadRequest(format!("Invalid file name: {}", raw)));
    }

    let extension = allowed_extension(&sanitized).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "File type not allowed: {} (allowed: {})",
            sanitized,
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    Ok((sanitized, extension))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    }
}

/// Create the temporary file and a second write handle to it off the runtime
async fn create_staging_file(
    dir: PathBuf,
    extension: String,
) -> std::io::Result<(NamedTempFile, std::fs::File)> {
    tokio::task::spawn_blocking(move || {
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(&dir)?;
        let writer = file.reopen()?;
        Ok((file, writer))
    })
    .await
    .map_err(std::io::Error::other)?
}

/// Find the `image` field, validate it and stream it to a temporary file
pub async fn stage_image(mut multipart: Multipart, settings: &UploadSettings) -> ApiResult<StagedUpload> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let (file_name, extension) = validate_file_name(field.file_name())?;

        tokio::fs::create_dir_all(&settings.upload_dir).await?;
        let (file, writer) = create_staging_file(settings.upload_dir.clone(), extension).await?;
        let mut writer = tokio::fs::File::from_std(writer);

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            writer.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }

        if size == 0 {
            return Err(ApiError::BadRequest("Uploaded image is empty".to_string()));
        }
        writer.flush().await?;

        tracing::debug!(
            file_name = %file_name,
            size,
            staged = %file.path().display(),
            "Upload staged"
        );

        return Ok(StagedUpload {
            file_name,
            file,
            size,
        });
    }

    Err(ApiError::BadRequest("No image was sent".to_string()))
}
