use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sample rate every asset is normalized to before inference.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Which decoding strategy produced an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategyKind {
    /// Format-specific streaming decode (symphonia).
    Streaming,
    /// Generic container-aware decode via the ffmpeg binary.
    Container,
    /// Minimal RIFF/WAVE header walk.
    WavHeader,
}

impl DecodeStrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStrategyKind::Streaming => "streaming",
            DecodeStrategyKind::Container => "container",
            DecodeStrategyKind::WavHeader => "wav_header",
        }
    }
}

/// A decoded audio sample: raw source bytes, normalized 16 kHz mono PCM,
/// and the duration every backend invocation on this asset reuses.
///
/// Immutable once constructed. The raw bytes are kept alongside the decoded
/// samples because the network backends forward the original file verbatim.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub source: PathBuf,
    pub data: Arc<Vec<u8>>,
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub strategy: DecodeStrategyKind,
}

impl AudioAsset {
    pub fn new(
        source: impl Into<PathBuf>,
        data: Vec<u8>,
        samples: Vec<f32>,
        duration_secs: f64,
        strategy: DecodeStrategyKind,
    ) -> Self {
        Self {
            source: source.into(),
            data: Arc::new(data),
            samples: Arc::new(samples),
            sample_rate: TARGET_SAMPLE_RATE,
            duration_secs,
            strategy,
        }
    }

    /// A degraded asset: the file was readable but no strategy could
    /// determine its duration. Callers that need a hard guarantee of a
    /// known duration must check this explicitly.
    pub fn is_degraded(&self) -> bool {
        self.duration_secs == 0.0
    }

    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string())
    }

    /// MIME type inferred from the source extension, for forwarding the raw
    /// bytes to a network backend.
    pub fn content_type(&self) -> &'static str {
        match extension_of(&self.source).as_deref() {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("flac") => "audio/flac",
            Some("ogg") => "audio/ogg",
            Some("webm") => "audio/webm",
            Some("wma") => "audio/x-ms-wma",
            _ => "application/octet-stream",
        }
    }
}

pub fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}
