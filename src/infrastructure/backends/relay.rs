use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{BackendTranscript, TranscriptionBackend, TranscriptionError};
use crate::domain::{AudioAsset, BackendKind, Segment};

pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 60;

/// Forwards audio to an external recognition server over a bounded-timeout
/// HTTP call. A non-success response or timeout is `Unreachable`; a missing
/// endpoint is `NotConfigured`.
pub struct RelayBackend {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl RelayBackend {
    pub fn new(endpoint: Option<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn forward_once(
        &self,
        endpoint: &str,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<RelayResponse, TranscriptionError> {
        let file_part = multipart::Part::bytes(asset.data.as_ref().clone())
            .file_name(asset.file_name())
            .mime_str(asset.content_type())
            .map_err(|e| TranscriptionError::EngineFailed(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new().part("audio_file", file_part);
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        tracing::debug!(endpoint = %endpoint, "Forwarding audio to relay server");

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscriptionError::Unreachable(format!("timeout: {}", e))
                } else {
                    TranscriptionError::Unreachable(format!("request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
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
            .json::<RelayResponse>()
            .await
            .map_err(|e| TranscriptionError::EngineFailed(format!("parse response: {}", e)))
    }
}

#[async_trait]
impl TranscriptionBackend for RelayBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relay
    }

    async fn transcribe(
        &self,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<BackendTranscript, TranscriptionError> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            TranscriptionError::NotConfigured("relay endpoint not set".to_string())
        })?;

        let started = Instant::now();

        // One immediate retry, no backoff.
        let parsed = match self.forward_once(endpoint, asset, language).await {
            Err(TranscriptionError::Unreachable(first)) => {
                tracing::warn!(error = %first, "Relay call failed; retrying once");
                self.forward_once(endpoint, asset, language).await
            }
            other => other,
        }?;

        let wall_secs = started.elapsed().as_secs_f64();
        // Prefer the server's own transcription timing when it reports one.
        let engine_time_secs = parsed.transcription_time.unwrap_or(wall_secs);

        let segments = parsed
            .segments
            .into_iter()
            .map(|s| Segment {
                start: s.start,
                end: s.end,
                text: s.text,
            })
            .collect::<Vec<_>>();

        tracing::info!(
            chars = parsed.text.len(),
            engine_time_secs = format_args!("{:.2}", engine_time_secs),
            "Relay transcription completed"
        );

        Ok(BackendTranscript {
            text: parsed.text.trim().to_string(),
            language: parsed.language.or_else(|| language.map(String::from)),
            segments,
            engine_time_secs,
            confidence: parsed.confidence,
        })
    }
}

/// The relay wire contract guarantees at least a transcript field; the rest
/// is optional.
#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(alias = "transcript")]
    text: String,
    language: Option<String>,
    #[serde(default)]
    segments: Vec<RelaySegment>,
    transcription_time: Option<f64>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RelaySegment {
    start: f64,
    end: f64,
    text: String,
}
