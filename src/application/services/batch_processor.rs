use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;

use crate::application::ports::{AudioDecoder, TranscriptionBackend};
use crate::application::services::TranscriptionOrchestrator;
use crate::domain::{extension_of, BatchItem, BatchItemError, BatchJob, Transcription};

/// Extensions considered audio candidates; anything else in the input
/// directory is skipped silently, counted as neither success nor error.
pub const SUPPORTED_EXTENSIONS: [&str; 7] =
    ["wav", "mp3", "m4a", "flac", "ogg", "wma", "webm"];

/// Upfront failures that prevent a batch from starting at all. Once the
/// file walk begins, failures are per-item and never abort the job.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("cannot read input directory {dir}: {source}")]
    InputDirUnreadable {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot create output directory {dir}: {source}")]
    OutputDirUncreatable {
        dir: PathBuf,
        source: std::io::Error,
    },
}

/// Applies the orchestrator across every supported file in a directory,
/// sequentially (bounds local-engine resource usage), isolating per-file
/// failures. Always visits every candidate exactly once.
pub struct BatchProcessor {
    decoder: Arc<dyn AudioDecoder>,
    orchestrator: TranscriptionOrchestrator,
}

impl BatchProcessor {
    pub fn new(decoder: Arc<dyn AudioDecoder>, orchestrator: TranscriptionOrchestrator) -> Self {
        Self {
            decoder,
            orchestrator,
        }
    }

    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        language: Option<&str>,
        backend: &dyn TranscriptionBackend,
    ) -> Result<BatchJob, BatchError> {
        let candidates = collect_candidates(input_dir)?;

        std::fs::create_dir_all(output_dir).map_err(|e| BatchError::OutputDirUncreatable {
            dir: output_dir.to_path_buf(),
            source: e,
        })?;

        tracing::info!(
            candidates = candidates.len(),
            input_dir = %input_dir.display(),
            backend = %backend.kind(),
            "Starting batch transcription"
        );

        let mut items = Vec::with_capacity(candidates.len());

        for path in candidates {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let span = tracing::info_span!("batch_item", file = %filename);
            let outcome = self
                .process_file(&path, output_dir, language, backend)
                .instrument(span)
                .await;

            match &outcome {
                Ok(t) => tracing::info!(file = %filename, chars = t.text.len(), "Batch item completed"),
                Err(e) => tracing::error!(file = %filename, error = %e, "Batch item failed"),
            }

            items.push(BatchItem { filename, outcome });
        }

        let job = BatchJob {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            language: language.map(String::from),
            items,
        };

        tracing::info!(
            successes = job.successes(),
            failures = job.failures(),
            "Batch transcription finished"
        );

        Ok(job)
    }

    async fn process_file(
        &self,
        path: &Path,
        output_dir: &Path,
        language: Option<&str>,
        backend: &dyn TranscriptionBackend,
    ) -> Result<Transcription, BatchItemError> {
        let asset = self
            .decoder
            .decode(path)
            .map_err(|e| BatchItemError::Decode(e.to_string()))?;

        let transcription = self
            .orchestrator
            .run(&asset, backend, language)
            .await
            .map_err(|e| BatchItemError::Transcription(e.to_string()))?;

        let artifact = artifact_path(output_dir, path);
        std::fs::write(&artifact, render_artifact(&asset.file_name(), &transcription))
            .map_err(|e| BatchItemError::ArtifactWrite(e.to_string()))?;

        tracing::debug!(artifact = %artifact.display(), "Result artifact written");

        Ok(transcription)
    }
}

fn collect_candidates(input_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let entries = std::fs::read_dir(input_dir).map_err(|e| BatchError::InputDirUnreadable {
        dir: input_dir.to_path_buf(),
        source: e,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            extension_of(p)
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
                .unwrap_or(false)
        })
        .collect();

    // Deterministic artifact naming is required; a stable visit order is a
    // convenient consequence.
    candidates.sort();
    Ok(candidates)
}

/// Artifact named deterministically from the input file's stem.
fn artifact_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    output_dir.join(format!("{}_transcription.txt", stem))
}

fn render_artifact(filename: &str, t: &Transcription) -> String {
    format!(
        "File: {}\nBackend: {}\nLanguage: {}\nDuration: {:.2}s\nTranscription time: {:.2}s\nSpeed ratio: {:.2}x\n\nTranscription:\n{}\n",
        filename,
        t.backend,
        t.language,
        t.audio_duration_secs,
        t.transcription_time_secs,
        t.speed_ratio(),
        t.text,
    )
}
