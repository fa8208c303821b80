use std::path::Path;

use crate::domain::AudioAsset;

/// Turns a raw audio file into a decoded asset with a known (or degraded)
/// duration. Decoding is CPU-bound and synchronous.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<AudioAsset, DecodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The file could not be read at all.
    #[error("audio file unreadable: {0}")]
    Unreadable(String),
    /// Every decoding strategy was exhausted without opening the content.
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
}
