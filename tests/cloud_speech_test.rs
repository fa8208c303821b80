use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use voxlab::application::ports::{TranscriptionBackend, TranscriptionError};
use voxlab::domain::{AudioAsset, DecodeStrategyKind};
use voxlab::infrastructure::backends::{CloudSpeechBackend, CloudSpeechConfig};

fn test_asset() -> AudioAsset {
    AudioAsset::new(
        PathBuf::from("speech.wav"),
        vec![0u8; 256],
        vec![0.0f32; 16_000],
        1.0,
        DecodeStrategyKind::Streaming,
    )
}

struct MockSpeechApi {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    shutdown: oneshot::Sender<()>,
}

impl MockSpeechApi {
    async fn start(response: Value, status: u16) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = (hits.clone(), response, status);

        let app = Router::new()
            .route(
                "/speech/recognition/conversation/cognitiveservices/v1",
                post(
                    |State((hits, body, status)): State<(Arc<AtomicUsize>, Value, u16)>| async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        (
                            axum::http::StatusCode::from_u16(status).unwrap(),
                            Json(body),
                        )
                    },
                ),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            hits,
            shutdown,
        }
    }

    fn backend(&self) -> CloudSpeechBackend {
        let config = CloudSpeechConfig::new("test-key".into(), "eastus".into())
            .with_endpoint(format!("http://{}", self.addr));
        CloudSpeechBackend::new(Some(config))
    }

    fn stop(self) -> usize {
        let _ = self.shutdown.send(());
        self.hits.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn given_successful_recognition_when_transcribing_then_display_text_is_returned() {
    let server = MockSpeechApi::start(
        json!({
            "RecognitionStatus": "Success",
            "DisplayText": "the quick brown fox",
            "NBest": [{"Confidence": 0.94}]
        }),
        200,
    )
    .await;
    let backend = server.backend();

    let result = backend.transcribe(&test_asset(), Some("en-US")).await.unwrap();

    assert_eq!(result.text, "the quick brown fox");
    assert_eq!(result.language.as_deref(), Some("en-US"));
    assert_eq!(result.confidence, Some(0.94));
    assert!(result.engine_time_secs >= 0.0);
    assert_eq!(server.stop(), 1);
}

#[tokio::test]
async fn given_no_match_when_transcribing_then_result_is_empty_success() {
    let server = MockSpeechApi::start(json!({ "RecognitionStatus": "NoMatch" }), 200).await;
    let backend = server.backend();

    let result = backend.transcribe(&test_asset(), None).await.unwrap();

    assert!(result.text.is_empty());
    server.stop();
}

#[tokio::test]
async fn given_unexpected_status_when_transcribing_then_error_is_engine_failure() {
    let server =
        MockSpeechApi::start(json!({ "RecognitionStatus": "InitialSilenceTimeout" }), 200).await;
    let backend = server.backend();

    let result = backend.transcribe(&test_asset(), None).await;

    assert!(matches!(result, Err(TranscriptionError::EngineFailed(_))));
    // Non-transport failures are never retried.
    assert_eq!(server.stop(), 1);
}

#[tokio::test]
async fn given_rejected_credentials_when_transcribing_then_error_is_not_configured() {
    let server = MockSpeechApi::start(json!({ "error": "invalid key" }), 401).await;
    let backend = server.backend();

    let result = backend.transcribe(&test_asset(), None).await;

    assert!(matches!(result, Err(TranscriptionError::NotConfigured(_))));
    assert_eq!(server.stop(), 1);
}

#[tokio::test]
async fn given_server_error_when_transcribing_then_exactly_one_retry_happens() {
    let server = MockSpeechApi::start(json!({ "error": "overloaded" }), 503).await;
    let backend = server.backend();

    let result = backend.transcribe(&test_asset(), None).await;

    assert!(matches!(result, Err(TranscriptionError::Unreachable(_))));
    assert_eq!(server.stop(), 2);
}

#[tokio::test]
async fn given_no_configuration_when_transcribing_then_error_is_not_configured() {
    let backend = CloudSpeechBackend::new(None);

    assert!(!backend.is_configured());
    let result = backend.transcribe(&test_asset(), None).await;

    assert!(matches!(result, Err(TranscriptionError::NotConfigured(_))));
}
