use std::collections::BTreeMap;

use serde::Serialize;

use super::backend_kind::BackendKind;
use super::transcription::Transcription;

/// Broad classification of a backend failure recorded in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotConfigured,
    Unreachable,
    Failed,
}

/// One backend's slot in a comparison: either a full transcription with its
/// derived throughput metrics, or the recorded failure. Every configured
/// backend gets exactly one entry; a failure is a value here, never a
/// missing key.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonEntry {
    Success {
        #[serde(flatten)]
        transcription: Transcription,
        speed_ratio: f64,
        /// Wall time of the whole backend call, including transport.
        total_time_secs: f64,
    },
    Failure {
        kind: FailureKind,
        error: String,
    },
}

impl ComparisonEntry {
    pub fn is_success(&self) -> bool {
        matches!(self, ComparisonEntry::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ComparisonEntry::Success { .. } => None,
            ComparisonEntry::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Side-by-side results for one audio asset across several backends.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRecord {
    pub source: String,
    /// The single duration every entry's speed ratio was derived from.
    pub audio_duration_secs: f64,
    pub entries: BTreeMap<BackendKind, ComparisonEntry>,
}

impl ComparisonRecord {
    pub fn entry(&self, kind: BackendKind) -> Option<&ComparisonEntry> {
        self.entries.get(&kind)
    }

    pub fn successes(&self) -> usize {
        self.entries.values().filter(|e| e.is_success()).count()
    }
}
