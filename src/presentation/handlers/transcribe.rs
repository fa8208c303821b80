use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::application::ports::{DecodeError, TranscriptionError};
use crate::domain::{BackendKind, Segment};
use crate::presentation::handlers::upload::{parse_audio_upload, reject};
use crate::presentation::state::AppState;

/// The single-backend transcription envelope.
#[derive(Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub text: String,
    pub language: String,
    pub backend: BackendKind,
    pub audio_duration: f64,
    pub transcription_time: f64,
    pub wall_time: f64,
    pub speed_ratio: f64,
    pub segments: Vec<Segment>,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    let upload = match parse_audio_upload(multipart).await {
        Ok(u) => u,
        Err(rejection) => return rejection.into_response(),
    };

    let asset = match state.decoder.decode(upload.temp.path()) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(error = %e, file = %upload.filename, "Upload decode failed");
            return decode_error_response(e).into_response();
        }
    };

    let kind = upload.backend.unwrap_or(BackendKind::LocalWhisper);
    let Some(backend) = state.backend_for(kind) else {
        return reject(
            StatusCode::BAD_REQUEST,
            format!("Backend not registered: {}", kind),
        )
        .into_response();
    };

    let result = state
        .orchestrator
        .run(&asset, backend.as_ref(), upload.language.as_deref())
        .await;

    match result {
        Ok(t) => {
            let speed_ratio = t.speed_ratio();
            Json(TranscribeResponse {
                success: true,
                text: t.text,
                language: t.language,
                backend: t.backend,
                audio_duration: t.audio_duration_secs,
                transcription_time: t.transcription_time_secs,
                wall_time: t.wall_time_secs,
                speed_ratio,
                segments: t.segments,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, backend = %kind, "Transcription failed");
            transcription_error_response(e).into_response()
        }
    }
}

pub fn decode_error_response(e: DecodeError) -> impl IntoResponse {
    let status = match e {
        DecodeError::Unreadable(_) => StatusCode::BAD_REQUEST,
        DecodeError::DecodingFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    reject(status, e.to_string())
}

fn transcription_error_response(e: TranscriptionError) -> impl IntoResponse {
    let status = match e {
        TranscriptionError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        TranscriptionError::Unreachable(_) => StatusCode::BAD_GATEWAY,
        TranscriptionError::ModelLoadFailed(_)
        | TranscriptionError::EngineFailed(_)
        | TranscriptionError::Cancelled(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    reject(status, e.to_string())
}
