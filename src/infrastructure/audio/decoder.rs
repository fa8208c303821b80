use std::path::Path;

use crate::application::ports::{AudioDecoder, DecodeError};
use crate::domain::{extension_of, AudioAsset, DecodeStrategyKind};

use super::ffmpeg_decode::{decode_via_ffmpeg, ffmpeg_available};
use super::symphonia_decode::decode_streaming;
use super::wav_header::decode_wav_header;

/// Decoded, normalized PCM produced by one strategy. `duration_secs == 0.0`
/// with empty samples marks the degraded outcome.
pub struct DecodedPcm {
    pub samples: Vec<f32>,
    pub duration_secs: f64,
}

/// Applies an ordered chain of decoding strategies and returns the first
/// success: format-specific streaming decode, then a container-aware decode
/// through ffmpeg, then a minimal raw WAV header reader.
///
/// `DecodeError` is returned only when no strategy can open the bytes at
/// all; a readable file whose duration cannot be determined yields a
/// degraded asset with duration 0.0 instead.
pub struct FallbackAudioDecoder {
    use_ffmpeg: bool,
}

impl FallbackAudioDecoder {
    pub fn new() -> Self {
        let use_ffmpeg = ffmpeg_available();
        if !use_ffmpeg {
            tracing::warn!("ffmpeg not found on PATH; container decode strategy disabled");
        }
        Self { use_ffmpeg }
    }
}

impl Default for FallbackAudioDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDecoder for FallbackAudioDecoder {
    fn decode(&self, path: &Path) -> Result<AudioAsset, DecodeError> {
        let data = std::fs::read(path)
            .map_err(|e| DecodeError::Unreadable(format!("{}: {}", path.display(), e)))?;

        if data.is_empty() {
            return Err(DecodeError::DecodingFailed(format!(
                "{}: empty file",
                path.display()
            )));
        }

        let ext = extension_of(path);
        let mut attempts: Vec<String> = Vec::new();

        match decode_streaming(&data, ext.as_deref()) {
            Ok(pcm) => return Ok(build_asset(path, data, pcm, DecodeStrategyKind::Streaming)),
            Err(reason) => {
                tracing::debug!(file = %path.display(), reason = %reason, "Streaming decode failed");
                attempts.push(format!("streaming: {}", reason));
            }
        }

        if self.use_ffmpeg {
            match decode_via_ffmpeg(&data) {
                Ok(pcm) => return Ok(build_asset(path, data, pcm, DecodeStrategyKind::Container)),
                Err(reason) => {
                    tracing::debug!(file = %path.display(), reason = %reason, "Container decode failed");
                    attempts.push(format!("container: {}", reason));
                }
            }
        }

        match decode_wav_header(&data) {
            Ok(pcm) => {
                if pcm.duration_secs == 0.0 {
                    tracing::warn!(
                        file = %path.display(),
                        "All strategies failed to determine duration; returning degraded asset"
                    );
                }
                Ok(build_asset(path, data, pcm, DecodeStrategyKind::WavHeader))
            }
            Err(reason) => {
                attempts.push(format!("wav_header: {}", reason));
                Err(DecodeError::DecodingFailed(format!(
                    "{}: {}",
                    path.display(),
                    attempts.join("; ")
                )))
            }
        }
    }
}

fn build_asset(
    path: &Path,
    data: Vec<u8>,
    pcm: DecodedPcm,
    strategy: DecodeStrategyKind,
) -> AudioAsset {
    tracing::debug!(
        file = %path.display(),
        strategy = strategy.as_str(),
        duration_secs = pcm.duration_secs,
        "Audio asset decoded"
    );
    AudioAsset::new(path, data, pcm.samples, pcm.duration_secs, strategy)
}
