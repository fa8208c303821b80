use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::domain::BackendKind;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub whisper_loaded: bool,
    pub backends: Vec<BackendKind>,
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            whisper_loaded: state.local.is_loaded(),
            backends: state.backends.iter().map(|b| b.kind()).collect(),
        }),
    )
}
