use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use voxlab::application::ports::TranscriptionBackend;
use voxlab::application::services::{ComparisonEngine, TranscriptionOrchestrator};
use voxlab::infrastructure::audio::FallbackAudioDecoder;
use voxlab::infrastructure::backends::{
    CloudSpeechBackend, LocalWhisperBackend, ModelSize, RelayBackend,
};
use voxlab::presentation::{create_router, AppState};

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
        let s = ((i as f64 * 0.05).sin() * 8000.0) as i16;
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}

/// A stand-in relay server so the API tests never touch a real engine.
async fn start_mock_relay() -> (SocketAddr, oneshot::Sender<()>) {
    let app = Router::new().route(
        "/transcribe",
        post(|| async {
            Json(json!({
                "text": "relayed words",
                "language": "en",
                "transcription_time": 0.5
            }))
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    (addr, tx)
}

/// Serves the application router on an ephemeral port. The local whisper
/// backend is present but never invoked, so no model download happens.
async fn start_app(relay_endpoint: Option<String>) -> (String, oneshot::Sender<()>) {
    let orchestrator = TranscriptionOrchestrator::new();
    let local = Arc::new(LocalWhisperBackend::new(ModelSize::Tiny));
    let backends: Vec<Arc<dyn TranscriptionBackend>> = vec![
        Arc::new(RelayBackend::new(relay_endpoint, 5)),
        Arc::new(CloudSpeechBackend::new(None)),
    ];

    let state = AppState {
        decoder: Arc::new(FallbackAudioDecoder::new()),
        backends,
        local,
        orchestrator,
        comparison: Arc::new(ComparisonEngine::new(orchestrator)),
    };

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    (format!("http://{}", addr), tx)
}

fn wav_form(filename: &str, bytes: Vec<u8>) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str("audio/wav")
        .unwrap();
    reqwest::multipart::Form::new().part("audio_file", part)
}

#[tokio::test]
async fn given_running_server_when_checking_health_then_backends_are_listed() {
    let (base, stop) = start_app(None).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["whisper_loaded"], false);
    let backends = body["backends"].as_array().unwrap();
    assert!(backends.contains(&json!("relay")));
    assert!(backends.contains(&json!("cloud_speech")));

    let _ = stop.send(());
}

#[tokio::test]
async fn given_wav_upload_to_relay_backend_then_transcription_envelope_is_returned() {
    let (relay_addr, stop_relay) = start_mock_relay().await;
    let (base, stop) = start_app(Some(format!("http://{relay_addr}/transcribe"))).await;

    let form = wav_form("speech.wav", build_wav(16_000, 32_000)).text("backend", "relay");
    let response = reqwest::Client::new()
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "relayed words");
    assert_eq!(body["backend"], "relay");
    assert_eq!(body["transcription_time"], 0.5);
    assert!((body["audio_duration"].as_f64().unwrap() - 2.0).abs() < 0.05);
    assert_eq!(body["speed_ratio"].as_f64().unwrap(), 4.0);

    let _ = stop.send(());
    let _ = stop_relay.send(());
}

#[tokio::test]
async fn given_upload_without_file_then_response_is_bad_request() {
    let (base, stop) = start_app(None).await;

    let form = reqwest::multipart::Form::new().text("language", "en");
    let response = reqwest::Client::new()
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("No audio file"));

    let _ = stop.send(());
}

#[tokio::test]
async fn given_unsupported_file_type_then_response_is_unsupported_media_type() {
    let (base, stop) = start_app(None).await;

    let part = reqwest::multipart::Part::bytes(vec![1, 2, 3])
        .file_name("document.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("audio_file", part);
    let response = reqwest::Client::new()
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE
    );

    let _ = stop.send(());
}

#[tokio::test]
async fn given_undecodable_audio_then_response_is_unprocessable() {
    let (base, stop) = start_app(None).await;

    let form = wav_form("noise.wav", vec![0xEE; 64]).text("backend", "relay");
    let response = reqwest::Client::new()
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        reqwest::StatusCode::UNPROCESSABLE_ENTITY
    );

    let _ = stop.send(());
}

#[tokio::test]
async fn given_unconfigured_cloud_backend_then_upload_returns_service_unavailable() {
    let (base, stop) = start_app(None).await;

    let form = wav_form("speech.wav", build_wav(16_000, 16_000)).text("backend", "azure");
    let response = reqwest::Client::new()
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        reqwest::StatusCode::SERVICE_UNAVAILABLE
    );

    let _ = stop.send(());
}

#[tokio::test]
async fn given_comparison_request_then_every_registered_backend_is_reported() {
    let (relay_addr, stop_relay) = start_mock_relay().await;
    let (base, stop) = start_app(Some(format!("http://{relay_addr}/transcribe"))).await;

    let form = wav_form("speech.wav", build_wav(16_000, 16_000));
    let response = reqwest::Client::new()
        .post(format!("{base}/compare"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "speech.wav");
    assert_eq!(body["results"]["relay"]["status"], "success");
    assert_eq!(body["results"]["relay"]["text"], "relayed words");
    assert_eq!(body["results"]["cloud_speech"]["status"], "failure");
    assert_eq!(body["results"]["cloud_speech"]["kind"], "not_configured");

    let _ = stop.send(());
    let _ = stop_relay.send(());
}
