use crate::domain::TARGET_SAMPLE_RATE;

use super::decoder::DecodedPcm;

/// Minimal RIFF/WAVE chunk walk, the last-resort strategy for plain PCM
/// files. When the header parses but no playable data chunk is found, the
/// result carries `duration_secs == 0.0` and no samples: the degraded
/// outcome the decoder surfaces instead of failing outright.
pub fn decode_wav_header(data: &[u8]) -> Result<DecodedPcm, String> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err("not a RIFF/WAVE file".to_string());
    }

    let mut fmt: Option<WavFmt> = None;
    let mut pcm_data: Option<&[u8]> = None;

    let mut offset = 12usize;
    while offset + 8 <= data.len() {
        let id = &data[offset..offset + 4];
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;
        let body_start = offset + 8;
        let body_end = (body_start + size).min(data.len());

        match id {
            b"fmt " if size >= 16 && body_start + 16 <= data.len() => {
                fmt = Some(WavFmt {
                    format_tag: u16::from_le_bytes([data[body_start], data[body_start + 1]]),
                    channels: u16::from_le_bytes([data[body_start + 2], data[body_start + 3]]),
                    sample_rate: u32::from_le_bytes([
                        data[body_start + 4],
                        data[body_start + 5],
                        data[body_start + 6],
                        data[body_start + 7],
                    ]),
                    bits_per_sample: u16::from_le_bytes([
                        data[body_start + 14],
                        data[body_start + 15],
                    ]),
                });
            }
            b"data" if size > 0 => {
                pcm_data = Some(&data[body_start..body_end]);
            }
            _ => {}
        }

        // Chunks are word-aligned
        offset = body_start + size + (size & 1);
    }

    let Some(fmt) = fmt else {
        return Err("missing fmt chunk".to_string());
    };

    if fmt.channels == 0 || fmt.sample_rate == 0 {
        return Err(format!(
            "implausible fmt chunk: {} channels at {} Hz",
            fmt.channels, fmt.sample_rate
        ));
    }

    let Some(pcm) = pcm_data else {
        // Readable header, no data: degraded result rather than an error.
        tracing::warn!("WAV header parsed but no data chunk found; duration unknown");
        return Ok(DecodedPcm {
            samples: Vec::new(),
            duration_secs: 0.0,
        });
    };

    if fmt.format_tag != 1 || fmt.bits_per_sample != 16 {
        return Err(format!(
            "unsupported WAV encoding: format {} at {} bits",
            fmt.format_tag, fmt.bits_per_sample
        ));
    }

    let frame_size = fmt.channels as usize * 2;
    let frames = pcm.len() / frame_size;
    let duration_secs = frames as f64 / fmt.sample_rate as f64;

    let mut mono = Vec::with_capacity(frames);
    for frame in pcm.chunks_exact(frame_size) {
        let mut acc = 0.0f32;
        for ch in frame.chunks_exact(2) {
            acc += i16::from_le_bytes([ch[0], ch[1]]) as f32 / i16::MAX as f32;
        }
        mono.push(acc / fmt.channels as f32);
    }

    let samples = if fmt.sample_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample_nearest(&mono, fmt.sample_rate, TARGET_SAMPLE_RATE)
    };

    tracing::debug!(
        frames = frames,
        sample_rate = fmt.sample_rate,
        duration_secs = duration_secs,
        "Audio decoded via raw WAV header reader"
    );

    Ok(DecodedPcm {
        samples,
        duration_secs,
    })
}

struct WavFmt {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

// Nearest-neighbor is enough for a last-resort path; the sinc resampler
// belongs to the streaming strategy.
fn resample_nearest(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let out_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    (0..out_len)
        .map(|i| {
            let src = (i as u64 * from_rate as u64 / to_rate as u64) as usize;
            samples[src.min(samples.len() - 1)]
        })
        .collect()
}
