use std::path::PathBuf;

use super::transcription::Transcription;

/// Per-file outcome inside a batch run. Failures are isolated here and
/// never escalate to a whole-batch failure.
#[derive(Debug)]
pub struct BatchItem {
    pub filename: String,
    pub outcome: Result<Transcription, BatchItemError>,
}

/// Any stage failing for one file inside a batch: decode, transcription,
/// or writing the result artifact.
#[derive(Debug, thiserror::Error)]
pub enum BatchItemError {
    #[error("decode: {0}")]
    Decode(String),
    #[error("transcription: {0}")]
    Transcription(String),
    #[error("artifact write: {0}")]
    ArtifactWrite(String),
}

/// The finalized result of running transcription across every supported
/// file in a directory.
#[derive(Debug)]
pub struct BatchJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub language: Option<String>,
    pub items: Vec<BatchItem>,
}

impl BatchJob {
    pub fn successes(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_ok()).count()
    }

    pub fn failures(&self) -> usize {
        self.items.len() - self.successes()
    }
}
