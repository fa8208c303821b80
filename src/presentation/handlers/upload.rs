use std::io::Write;
use std::str::FromStr;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::application::services::SUPPORTED_EXTENSIONS;
use crate::domain::BackendKind;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type UploadRejection = (StatusCode, Json<ErrorResponse>);

pub fn reject(status: StatusCode, error: impl Into<String>) -> UploadRejection {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// A parsed audio upload. The temp file is a scoped resource: dropping this
/// struct releases it on every exit path, including errors.
pub struct AudioUpload {
    pub temp: NamedTempFile,
    pub filename: String,
    pub language: Option<String>,
    pub backend: Option<BackendKind>,
}

/// Reads the multipart form: `audio_file` (required) plus optional
/// `language` and `backend` text fields. Recorded browser blobs arrive
/// without a useful filename but with an audio content type; both shapes
/// are accepted.
pub async fn parse_audio_upload(mut multipart: Multipart) -> Result<AudioUpload, UploadRejection> {
    let mut upload: Option<(String, Vec<u8>, Option<String>)> = None;
    let mut language: Option<String> = None;
    let mut backend: Option<BackendKind> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return Err(reject(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                ));
            }
        };

        match field.name().unwrap_or_default() {
            "audio_file" => {
                let filename = field.file_name().unwrap_or("recording.webm").to_string();
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to read file bytes");
                    reject(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file: {}", e),
                    )
                })?;
                upload = Some((filename, data.to_vec(), content_type));
            }
            "language" => {
                let value = field.text().await.unwrap_or_default();
                if !value.trim().is_empty() {
                    language = Some(value.trim().to_string());
                }
            }
            "backend" => {
                let value = field.text().await.unwrap_or_default();
                if !value.trim().is_empty() {
                    backend = Some(BackendKind::from_str(value.trim()).map_err(|e| {
                        reject(StatusCode::BAD_REQUEST, e)
                    })?);
                }
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let Some((filename, data, content_type)) = upload else {
        tracing::warn!("Upload request with no audio file");
        return Err(reject(StatusCode::BAD_REQUEST, "No audio file provided"));
    };

    if data.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "No file selected"));
    }

    if !is_valid_audio_upload(&filename, content_type.as_deref()) {
        return Err(reject(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!(
                "Invalid file type. Allowed: {} or recorded audio",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        ));
    }

    tracing::debug!(
        filename = %filename,
        bytes = data.len(),
        "Audio upload received"
    );

    let suffix = extension_from(&filename)
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| ".webm".to_string());

    let mut temp = tempfile::Builder::new()
        .prefix("voxlab-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to stage upload");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to stage upload: {}", e),
            )
        })?;

    temp.write_all(&data).map_err(|e| {
        reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to stage upload: {}", e),
        )
    })?;
    temp.flush().map_err(|e| {
        reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to stage upload: {}", e),
        )
    })?;

    Ok(AudioUpload {
        temp,
        filename,
        language,
        backend,
    })
}

fn extension_from(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

fn is_valid_audio_upload(filename: &str, content_type: Option<&str>) -> bool {
    if let Some(ext) = extension_from(filename) {
        if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }
    // MediaRecorder blobs carry a content type rather than an extension.
    matches!(
        content_type,
        Some("audio/webm" | "audio/ogg" | "audio/wav" | "audio/mp4" | "audio/mpeg")
    )
}
