use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::domain::TARGET_SAMPLE_RATE;

use super::decoder::DecodedPcm;

/// Format-specific streaming decode: probe the container, decode every
/// packet of the default track, downmix to mono and resample to 16 kHz.
/// The duration is taken from the frames actually decoded at the source
/// rate, before resampling.
pub fn decode_streaming(data: &[u8], hint_ext: Option<&str>) -> Result<DecodedPcm, String> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = hint_ext {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("probe: {}", e))?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| "no audio track found".to_string())?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| "unknown sample rate".to_string())?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| format!("codec: {}", e))?;

    let mono = drain_packets(reader.as_mut(), decoder, track_id, channels)?;
    if mono.is_empty() {
        return Err("no audio samples decoded".to_string());
    }

    // Duration comes from the source-rate frame count, not the resampled
    // length, so it stays exact for any target rate.
    let duration_secs = mono.len() as f64 / source_rate as f64;

    let samples = if source_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample(&mono, source_rate, TARGET_SAMPLE_RATE)?
    };

    tracing::debug!(
        samples = samples.len(),
        duration_secs = duration_secs,
        "Audio decoded to 16kHz mono PCM via streaming decoder"
    );

    Ok(DecodedPcm {
        samples,
        duration_secs,
    })
}

/// Pulls every packet of the selected track through the codec, folding
/// multi-channel frames down to mono as they arrive.
fn drain_packets(
    reader: &mut dyn FormatReader,
    mut decoder: Box<dyn Decoder>,
    track_id: u32,
    channels: usize,
) -> Result<Vec<f32>, String> {
    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(mono);
            }
            Err(e) => return Err(format!("packet: {}", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(format!("decode: {}", e)),
        };

        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let mut buf = SampleBuffer::<f32>::new(frames as u64, *decoded.spec());
        buf.copy_interleaved_ref(decoded);

        if channels > 1 {
            mono.extend(
                buf.samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        } else {
            mono.extend_from_slice(buf.samples());
        }
    }
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, String> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = 1024;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| format!("resampler init: {}", e))?;

    let expected_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(expected_len + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        // SincFixedIn wants full chunks; the tail is zero-padded and the
        // surplus trimmed off below.
        let mut input = chunk.to_vec();
        input.resize(chunk_size, 0.0);

        let frames = resampler
            .process(&[input], None)
            .map_err(|e| format!("resample: {}", e))?;
        if let Some(channel) = frames.into_iter().next() {
            output.extend(channel);
        }
    }

    output.truncate(expected_len);
    Ok(output)
}
