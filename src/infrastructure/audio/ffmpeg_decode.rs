use std::io::Write;
use std::process::{Command, Stdio};

use crate::domain::TARGET_SAMPLE_RATE;

use super::decoder::DecodedPcm;

/// Whether the ffmpeg binary is reachable on PATH. The container strategy
/// is skipped silently when it is not.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Generic container-aware decode: hand the bytes to ffmpeg and read back
/// raw 16 kHz mono f32le PCM. Covers formats the streaming decoder has no
/// codec for (webm/opus, wma).
pub fn decode_via_ffmpeg(data: &[u8]) -> Result<DecodedPcm, String> {
    let mut input = tempfile::NamedTempFile::new().map_err(|e| format!("tempfile: {}", e))?;
    input
        .write_all(data)
        .map_err(|e| format!("tempfile write: {}", e))?;
    input.flush().map_err(|e| format!("tempfile flush: {}", e))?;

    let output = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
        ])
        .arg(input.path())
        .args([
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            "16000",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("spawn ffmpeg: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("ffmpeg exited {}: {}", output.status, stderr.trim()));
    }

    if output.stdout.len() < 4 {
        return Err("ffmpeg produced no audio samples".to_string());
    }

    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let duration_secs = samples.len() as f64 / TARGET_SAMPLE_RATE as f64;

    tracing::debug!(
        samples = samples.len(),
        duration_secs = duration_secs,
        "Audio decoded to 16kHz mono PCM via ffmpeg"
    );

    Ok(DecodedPcm {
        samples,
        duration_secs,
    })
}
