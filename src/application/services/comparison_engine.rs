use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::application::ports::TranscriptionBackend;
use crate::application::services::TranscriptionOrchestrator;
use crate::domain::{speed_ratio, AudioAsset, ComparisonEntry, ComparisonRecord};

/// Runs the same audio asset through multiple backends and assembles a
/// side-by-side record.
///
/// Backend calls share nothing but the read-only asset, so they are issued
/// concurrently; the engine waits for every configured backend to settle
/// before assembling the record. One backend failing or being unconfigured
/// never fails the comparison: its entry records the error instead.
pub struct ComparisonEngine {
    orchestrator: TranscriptionOrchestrator,
}

impl ComparisonEngine {
    pub fn new(orchestrator: TranscriptionOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn run(
        &self,
        asset: &AudioAsset,
        backends: &[Arc<dyn TranscriptionBackend>],
        language: Option<&str>,
    ) -> ComparisonRecord {
        tracing::info!(
            file = %asset.file_name(),
            backends = backends.len(),
            duration_secs = asset.duration_secs,
            "Starting backend comparison"
        );

        let calls = backends.iter().map(|backend| async {
            let started = std::time::Instant::now();
            let outcome = self
                .orchestrator
                .run(asset, backend.as_ref(), language)
                .await;
            (backend.kind(), outcome, started.elapsed().as_secs_f64())
        });

        let settled = join_all(calls).await;

        let mut entries = BTreeMap::new();
        for (kind, outcome, total_time_secs) in settled {
            let entry = match outcome {
                Ok(transcription) => {
                    let ratio = speed_ratio(
                        asset.duration_secs,
                        transcription.transcription_time_secs,
                    );
                    ComparisonEntry::Success {
                        transcription,
                        speed_ratio: ratio,
                        total_time_secs,
                    }
                }
                Err(e) => {
                    tracing::warn!(backend = %kind, error = %e, "Backend failed in comparison");
                    ComparisonEntry::Failure {
                        kind: e.failure_kind(),
                        error: e.to_string(),
                    }
                }
            };
            entries.insert(kind, entry);
        }

        let record = ComparisonRecord {
            source: asset.file_name(),
            audio_duration_secs: asset.duration_secs,
            entries,
        };

        tracing::info!(
            successes = record.successes(),
            total = record.entries.len(),
            "Comparison assembled"
        );

        record
    }
}
