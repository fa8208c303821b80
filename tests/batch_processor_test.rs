use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use voxlab::application::ports::{BackendTranscript, TranscriptionBackend, TranscriptionError};
use voxlab::application::services::{BatchError, BatchProcessor, TranscriptionOrchestrator};
use voxlab::domain::{AudioAsset, BackendKind};
use voxlab::infrastructure::audio::FallbackAudioDecoder;

fn build_wav(sample_rate: u32, num_samples: u32) -> Vec<u8> {
    let data_size = num_samples * 2;
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for i in 0..num_samples {
        let s = ((i as f64 * 0.1).sin() * 8000.0) as i16;
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}

/// Succeeds for every file except those whose name contains "broken".
struct SelectiveBackend;

#[async_trait]
impl TranscriptionBackend for SelectiveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalWhisper
    }

    async fn transcribe(
        &self,
        asset: &AudioAsset,
        _language: Option<&str>,
    ) -> Result<BackendTranscript, TranscriptionError> {
        if asset.file_name().contains("broken") {
            return Err(TranscriptionError::EngineFailed("decode ran aground".into()));
        }
        Ok(BackendTranscript {
            text: format!("transcript of {}", asset.file_name()),
            language: Some("en".into()),
            engine_time_secs: 0.1,
            ..Default::default()
        })
    }
}

fn processor() -> BatchProcessor {
    BatchProcessor::new(
        Arc::new(FallbackAudioDecoder::new()),
        TranscriptionOrchestrator::new(),
    )
}

#[tokio::test]
async fn given_directory_of_wavs_when_batching_then_an_artifact_is_written_per_file() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let wav = build_wav(16_000, 16_000);
    for name in ["a.wav", "b.wav", "c.wav"] {
        std::fs::write(input.path().join(name), &wav).unwrap();
    }
    // Non-audio files are skipped, not failed.
    std::fs::write(input.path().join("notes.txt"), b"not audio").unwrap();

    let job = processor()
        .run(input.path(), output.path(), None, &SelectiveBackend)
        .await
        .unwrap();

    assert_eq!(job.items.len(), 3);
    assert_eq!(job.successes(), 3);
    assert_eq!(job.failures(), 0);
    for stem in ["a", "b", "c"] {
        let artifact = output.path().join(format!("{stem}_transcription.txt"));
        let body = std::fs::read_to_string(&artifact).unwrap();
        assert!(body.contains(&format!("transcript of {stem}.wav")));
    }
}

#[tokio::test]
async fn given_one_failing_file_when_batching_then_remaining_files_still_process() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let wav = build_wav(16_000, 16_000);
    std::fs::write(input.path().join("broken.wav"), &wav).unwrap();
    std::fs::write(input.path().join("fine.wav"), &wav).unwrap();
    // Undecodable audio also fails in isolation.
    std::fs::write(input.path().join("garbage.mp3"), vec![0xAB; 128]).unwrap();

    let job = processor()
        .run(input.path(), output.path(), Some("en"), &SelectiveBackend)
        .await
        .unwrap();

    assert_eq!(job.items.len(), 3);
    assert_eq!(job.successes(), 1);
    assert_eq!(job.failures(), 2);
    assert!(output.path().join("fine_transcription.txt").exists());
    assert!(!output.path().join("broken_transcription.txt").exists());
}

#[tokio::test]
async fn given_empty_directory_when_batching_then_job_has_no_items() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let job = processor()
        .run(input.path(), output.path(), None, &SelectiveBackend)
        .await
        .unwrap();

    assert!(job.items.is_empty());
    assert_eq!(job.successes(), 0);
    assert_eq!(job.failures(), 0);
}

#[tokio::test]
async fn given_missing_input_directory_when_batching_then_run_fails_upfront() {
    let output = tempfile::tempdir().unwrap();

    let result = processor()
        .run(
            Path::new("/nonexistent/input"),
            output.path(),
            None,
            &SelectiveBackend,
        )
        .await;

    assert!(matches!(result, Err(BatchError::InputDirUnreadable { .. })));
}

#[tokio::test]
async fn given_missing_output_directory_when_batching_then_it_is_created() {
    let input = tempfile::tempdir().unwrap();
    let output_root = tempfile::tempdir().unwrap();
    let nested = output_root.path().join("deep").join("transcriptions");
    std::fs::write(input.path().join("a.wav"), build_wav(16_000, 8_000)).unwrap();

    let job = processor()
        .run(input.path(), &nested, None, &SelectiveBackend)
        .await
        .unwrap();

    assert_eq!(job.successes(), 1);
    assert!(nested.join("a_transcription.txt").exists());
}

#[tokio::test]
async fn given_artifact_header_then_it_reports_backend_and_metrics() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("clip.wav"), build_wav(16_000, 32_000)).unwrap();

    processor()
        .run(input.path(), output.path(), Some("en"), &SelectiveBackend)
        .await
        .unwrap();

    let body = std::fs::read_to_string(output.path().join("clip_transcription.txt")).unwrap();
    assert!(body.contains("clip.wav"));
    assert!(body.contains("local_whisper"));
    assert!(body.contains("2.00"), "expected ~2s duration in header: {body}");
}
