use std::collections::BTreeMap;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::domain::{BackendKind, ComparisonEntry};
use crate::presentation::handlers::transcribe::decode_error_response;
use crate::presentation::handlers::upload::parse_audio_upload;
use crate::presentation::state::AppState;

/// Side-by-side comparison envelope. `success` reflects the comparison
/// itself; individual backend failures live inside their entries.
#[derive(Serialize)]
pub struct CompareResponse {
    pub success: bool,
    pub source: String,
    pub audio_duration: f64,
    pub results: BTreeMap<BackendKind, ComparisonEntry>,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn compare_handler(
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

    let record = state
        .comparison
        .run(&asset, &state.backends, upload.language.as_deref())
        .await;

    Json(CompareResponse {
        success: true,
        source: upload.filename,
        audio_duration: record.audio_duration_secs,
        results: record.entries,
    })
    .into_response()
}
