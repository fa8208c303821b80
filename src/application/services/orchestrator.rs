use std::time::Instant;

use crate::application::ports::{TranscriptionBackend, TranscriptionError};
use crate::domain::{AudioAsset, Transcription};

/// Drives one backend against one audio asset, measuring wall-clock time
/// around the call separately from whatever in-engine timing the backend
/// reports, and stamping the asset's precomputed duration onto the result.
///
/// Never retries: retry policy, where it exists at all, belongs to the
/// backend implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptionOrchestrator;

impl TranscriptionOrchestrator {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(
        &self,
        asset: &AudioAsset,
        backend: &dyn TranscriptionBackend,
        language: Option<&str>,
    ) -> Result<Transcription, TranscriptionError> {
        let kind = backend.kind();
        tracing::debug!(
            backend = %kind,
            file = %asset.file_name(),
            duration_secs = asset.duration_secs,
            "Dispatching transcription"
        );

        let started = Instant::now();
        let output = backend.transcribe(asset, language).await?;
        let wall_time_secs = started.elapsed().as_secs_f64();

        let language = output
            .language
            .or_else(|| language.map(String::from))
            .unwrap_or_else(|| "unknown".to_string());

        let transcription = Transcription {
            text: output.text,
            language,
            segments: output.segments,
            transcription_time_secs: output.engine_time_secs,
            wall_time_secs,
            audio_duration_secs: asset.duration_secs,
            backend: kind,
            confidence: output.confidence,
        };

        tracing::info!(
            backend = %kind,
            chars = transcription.text.len(),
            wall_time_secs = format_args!("{:.2}", wall_time_secs),
            speed_ratio = format_args!("{:.2}", transcription.speed_ratio()),
            "Transcription completed"
        );

        Ok(transcription)
    }
}
