use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{BackendTranscript, TranscriptionBackend, TranscriptionError};
use crate::domain::{AudioAsset, BackendKind};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LANGUAGE: &str = "en-US";

/// Credentials and endpoint for the hosted speech API, resolved from
/// explicit configuration or the environment before any call is attempted.
#[derive(Debug, Clone)]
pub struct CloudSpeechConfig {
    pub subscription_key: String,
    pub region: String,
    /// Full base URL override; tests point this at a mock server.
    pub endpoint_override: Option<String>,
}

impl CloudSpeechConfig {
    pub fn new(subscription_key: String, region: String) -> Self {
        Self {
            subscription_key,
            region,
            endpoint_override: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint_override = Some(endpoint);
        self
    }

    /// `AZURE_SPEECH_KEY` / `AZURE_SPEECH_REGION`. `None` when the key is
    /// absent: a configuration condition, not a runtime failure.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("AZURE_SPEECH_KEY").ok()?;
        if key.is_empty() {
            return None;
        }
        let region =
            std::env::var("AZURE_SPEECH_REGION").unwrap_or_else(|_| "eastus".to_string());
        Some(Self::new(key, region))
    }

    fn recognition_url(&self, language: &str) -> String {
        let base = match &self.endpoint_override {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.stt.speech.microsoft.com", self.region),
        };
        format!(
            "{}/speech/recognition/conversation/cognitiveservices/v1?language={}",
            base, language
        )
    }
}

/// Hosted cloud speech-to-text. Stateless per call; an instance built
/// without configuration still satisfies the backend contract by returning
/// `NotConfigured`, so comparisons can report the other backends.
pub struct CloudSpeechBackend {
    client: reqwest::Client,
    config: Option<CloudSpeechConfig>,
}

impl CloudSpeechBackend {
    pub fn new(config: Option<CloudSpeechConfig>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn recognize_once(
        &self,
        config: &CloudSpeechConfig,
        asset: &AudioAsset,
        language: &str,
    ) -> Result<CloudRecognitionResponse, TranscriptionError> {
        let url = config.recognition_url(language);

        tracing::debug!(region = %config.region, language = %language, "Sending audio to cloud speech API");

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &config.subscription_key)
            .header("Content-Type", asset.content_type())
            .header("Accept", "application/json")
            .body(asset.data.as_ref().clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscriptionError::Unreachable(format!("timeout: {}", e))
                } else {
                    TranscriptionError::Unreachable(format!("request: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TranscriptionError::NotConfigured(format!(
                "cloud speech rejected credentials: status {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::Unreachable(format!(
                "status {}: {}",
                status, body
            )));
        }

        response
            .json::<CloudRecognitionResponse>()
            .await
            .map_err(|e| TranscriptionError::EngineFailed(format!("parse response: {}", e)))
    }
}

#[async_trait]
impl TranscriptionBackend for CloudSpeechBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::CloudSpeech
    }

    async fn transcribe(
        &self,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<BackendTranscript, TranscriptionError> {
        let config = self.config.as_ref().ok_or_else(|| {
            TranscriptionError::NotConfigured(
                "cloud speech key/region missing; set AZURE_SPEECH_KEY and AZURE_SPEECH_REGION"
                    .to_string(),
            )
        })?;

        let language = language.unwrap_or(DEFAULT_LANGUAGE);
        let started = Instant::now();

        // At most one immediate retry on an unreachable service, never
        // with backoff.
        let result = match self.recognize_once(config, asset, language).await {
            Err(TranscriptionError::Unreachable(first)) => {
                tracing::warn!(error = %first, "Cloud speech call failed; retrying once");
                self.recognize_once(config, asset, language).await
            }
            other => other,
        }?;

        let engine_time_secs = started.elapsed().as_secs_f64();

        let text = match result.recognition_status.as_str() {
            "Success" => result.display_text.unwrap_or_default(),
            // No speech is a valid empty outcome, not an error.
            "NoMatch" => {
                tracing::info!("Cloud speech detected no speech in audio");
                String::new()
            }
            other => {
                return Err(TranscriptionError::EngineFailed(format!(
                    "recognition status: {}",
                    other
                )));
            }
        };

        let confidence = result
            .n_best
            .as_ref()
            .and_then(|nbest| nbest.first())
            .map(|alt| alt.confidence);

        tracing::info!(
            chars = text.len(),
            engine_time_secs = format_args!("{:.2}", engine_time_secs),
            "Cloud speech transcription completed"
        );

        Ok(BackendTranscript {
            text: text.trim().to_string(),
            language: Some(language.to_string()),
            // Word-level timing is not available in this recognition mode.
            segments: Vec::new(),
            engine_time_secs,
            confidence,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CloudRecognitionResponse {
    #[serde(rename = "RecognitionStatus")]
    recognition_status: String,
    #[serde(rename = "DisplayText")]
    display_text: Option<String>,
    #[serde(rename = "NBest")]
    n_best: Option<Vec<NBestAlternative>>,
}

#[derive(Debug, Deserialize)]
struct NBestAlternative {
    #[serde(rename = "Confidence")]
    confidence: f32,
}
