use std::sync::Arc;

use crate::application::ports::{AudioDecoder, TranscriptionBackend};
use crate::application::services::{ComparisonEngine, TranscriptionOrchestrator};
use crate::domain::BackendKind;
use crate::infrastructure::backends::LocalWhisperBackend;

/// Everything the handlers need, built once at startup. All backends are
/// registered regardless of configuration state so that a comparison can
/// record `NotConfigured` entries instead of omitting them.
#[derive(Clone)]
pub struct AppState {
    pub decoder: Arc<dyn AudioDecoder>,
    pub backends: Vec<Arc<dyn TranscriptionBackend>>,
    pub local: Arc<LocalWhisperBackend>,
    pub orchestrator: TranscriptionOrchestrator,
    pub comparison: Arc<ComparisonEngine>,
}

impl AppState {
    pub fn backend_for(&self, kind: BackendKind) -> Option<Arc<dyn TranscriptionBackend>> {
        self.backends.iter().find(|b| b.kind() == kind).cloned()
    }
}
