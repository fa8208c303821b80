use async_trait::async_trait;

use crate::domain::{AudioAsset, BackendKind, FailureKind, Segment};

/// Raw output of one backend call, before the orchestrator stamps timing
/// and asset metadata onto it.
///
/// "No speech detected" is a valid outcome: `text` is empty and no error
/// propagates.
#[derive(Debug, Clone, Default)]
pub struct BackendTranscript {
    pub text: String,
    /// Detected language, when the backend reports one.
    pub language: Option<String>,
    pub segments: Vec<Segment>,
    /// Time the engine itself spent transcribing, in seconds.
    pub engine_time_secs: f64,
    pub confidence: Option<f32>,
}

/// One of the three interchangeable speech-recognition engines.
///
/// Implementations must never panic on missing configuration: an
/// unconfigured backend returns `NotConfigured` so that comparisons can
/// still report the remaining backends.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn transcribe(
        &self,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<BackendTranscript, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("backend not configured: {0}")]
    NotConfigured(String),
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("transcription failed: {0}")]
    EngineFailed(String),
    #[error("transcription cancelled: {0}")]
    Cancelled(String),
}

impl TranscriptionError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TranscriptionError::NotConfigured(_) => FailureKind::NotConfigured,
            TranscriptionError::Unreachable(_) => FailureKind::Unreachable,
            TranscriptionError::ModelLoadFailed(_)
            | TranscriptionError::EngineFailed(_)
            | TranscriptionError::Cancelled(_) => FailureKind::Failed,
        }
    }
}
