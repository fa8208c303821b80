use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;
use tokio::sync::{Mutex, OnceCell};

use crate::application::ports::{BackendTranscript, TranscriptionBackend, TranscriptionError};
use crate::domain::{AudioAsset, BackendKind, Segment, TARGET_SAMPLE_RATE};

/// Whisper model size; maps to a Hugging Face hub repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }

    pub fn repo_id(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "openai/whisper-tiny",
            ModelSize::Base => "openai/whisper-base",
            ModelSize::Small => "openai/whisper-small",
            ModelSize::Medium => "openai/whisper-medium",
            ModelSize::Large => "openai/whisper-large-v3",
        }
    }
}

impl FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => Err(format!(
                "Unknown model size: {}. Expected: tiny, base, small, medium, or large",
                other
            )),
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Locally-run Whisper inference via candle.
///
/// The model handle loads lazily behind a `OnceCell`, so at most one
/// concurrent load happens per backend instance and every later call reuses
/// the handle. Inference is compute-bound and runs to completion once
/// started; there is no mid-flight cancellation.
pub struct LocalWhisperBackend {
    size: ModelSize,
    engine: OnceCell<Arc<LoadedWhisper>>,
}

impl LocalWhisperBackend {
    pub fn new(size: ModelSize) -> Self {
        Self {
            size,
            engine: OnceCell::new(),
        }
    }

    pub fn model_size(&self) -> ModelSize {
        self.size
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    async fn engine(&self) -> Result<&Arc<LoadedWhisper>, TranscriptionError> {
        self.engine
            .get_or_try_init(|| async {
                let size = self.size;
                tokio::task::spawn_blocking(move || LoadedWhisper::load(size))
                    .await
                    .map_err(|e| {
                        TranscriptionError::ModelLoadFailed(format!("load task: {}", e))
                    })?
                    .map(Arc::new)
            })
            .await
    }
}

#[async_trait]
impl TranscriptionBackend for LocalWhisperBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalWhisper
    }

    async fn transcribe(
        &self,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<BackendTranscript, TranscriptionError> {
        let engine = self.engine().await?;
        engine.transcribe(asset, language).await
    }
}

struct LoadedWhisper {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
}

impl LoadedWhisper {
    fn load(size: ModelSize) -> Result<Self, TranscriptionError> {
        let device = Device::Cpu;

        tracing::info!(
            device = ?device,
            model = size.as_str(),
            "Loading local Whisper model"
        );
        let started = Instant::now();

        let api = Api::new().map_err(|e| load_err("hub api", e))?;
        let repo = api.repo(Repo::new(size.repo_id().to_string(), RepoType::Model));
        let fetch = |name: &str| repo.get(name).map_err(|e| load_err(name, e));

        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let mel_bytes_path = api
            .repo(Repo::new(
                "FL33TW00D-HF/whisper-base".to_string(),
                RepoType::Model,
            ))
            .get("melfilters.bytes")
            .map_err(|e| load_err("melfilters.bytes", e))?;

        let config: Config = serde_json::from_str(
            &std::fs::read_to_string(&config_path).map_err(|e| load_err("read config", e))?,
        )
        .map_err(|e| load_err("parse config", e))?;

        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| load_err("tokenizer", e))?;

        let mel_bytes =
            std::fs::read(&mel_bytes_path).map_err(|e| load_err("mel filters", e))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], m::DTYPE, &device)
                .map_err(|e| load_err("weights", e))?
        };

        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| load_err("model", e))?;

        tracing::info!(
            load_secs = format_args!("{:.2}", started.elapsed().as_secs_f64()),
            "Local Whisper model loaded"
        );

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
            mel_filters,
        })
    }

    async fn transcribe(
        &self,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<BackendTranscript, TranscriptionError> {
        let pcm: &[f32] = &asset.samples;
        let started = Instant::now();

        let chunk_samples = m::N_SAMPLES;
        let mut mel_tensors = Vec::new();

        for (i, chunk) in pcm.chunks(chunk_samples).enumerate() {
            let chunk_secs = chunk.len() as f64 / TARGET_SAMPLE_RATE as f64;
            let samples = if chunk.len() < chunk_samples {
                let mut padded = chunk.to_vec();
                padded.resize(chunk_samples, 0.0);
                padded
            } else {
                chunk.to_vec()
            };

            let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel_data.len() / n_mel;

            let mel_tensor = Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                .map_err(|e| engine_err("mel tensor", e))?;

            mel_tensors.push((i, chunk_secs, mel_tensor));
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut model = self.model.lock().await;

        for (i, chunk_secs, mel_tensor) in mel_tensors {
            tracing::debug!(window = i, "Transcribing audio window");
            let text = decode_window(
                &mut model,
                &self.tokenizer,
                &self.device,
                &mel_tensor,
                language,
            )?;
            if !text.is_empty() {
                let window_secs = chunk_samples as f64 / TARGET_SAMPLE_RATE as f64;
                let start = i as f64 * window_secs;
                segments.push(Segment {
                    start,
                    end: start + chunk_secs,
                    text,
                });
            }
        }

        drop(model);

        let engine_time_secs = started.elapsed().as_secs_f64();
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        tracing::info!(
            windows = segments.len(),
            chars = text.len(),
            engine_time_secs = format_args!("{:.2}", engine_time_secs),
            "Local Whisper transcription completed"
        );

        Ok(BackendTranscript {
            text,
            language: language.map(String::from),
            segments,
            engine_time_secs,
            confidence: None,
        })
    }
}

fn decode_window(
    model: &mut m::model::Whisper,
    tokenizer: &Tokenizer,
    device: &Device,
    mel: &Tensor,
    language: Option<&str>,
) -> Result<String, TranscriptionError> {
    let sot_token = token_id(tokenizer, m::SOT_TOKEN)?;
    let transcribe_token = token_id(tokenizer, m::TRANSCRIBE_TOKEN)?;
    let no_timestamps_token = token_id(tokenizer, m::NO_TIMESTAMPS_TOKEN)?;
    let eot_token = token_id(tokenizer, m::EOT_TOKEN)?;

    let audio_features = model
        .encoder
        .forward(mel, true)
        .map_err(|e| engine_err("encoder", e))?;

    let mut tokens = vec![sot_token];
    // The language token is optional in greedy decoding; insert it only when
    // the caller hinted a language the tokenizer knows.
    if let Some(lang) = language {
        if let Some(id) = tokenizer.token_to_id(&format!("<|{}|>", lang)) {
            tokens.push(id);
        }
    }
    tokens.push(transcribe_token);
    tokens.push(no_timestamps_token);

    let prompt_len = tokens.len();
    let max_tokens = 224;
    let mut decoded_text = String::new();

    for _ in 0..max_tokens {
        let token_tensor = Tensor::new(tokens.as_slice(), device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| engine_err("prompt tensor", e))?;

        // The KV cache is flushed on the first pass for each window.
        let decoder_output = model
            .decoder
            .forward(&token_tensor, &audio_features, tokens.len() == prompt_len)
            .map_err(|e| engine_err("decoder", e))?;

        let logits = decoder_output
            .squeeze(0)
            .and_then(|t| model.decoder.final_linear(&t))
            .map_err(|e| engine_err("linear", e))?;

        let next_token = logits
            .dim(0)
            .and_then(|seq_len| logits.get(seq_len - 1))
            .and_then(|last| last.argmax(0))
            .and_then(|t| t.to_scalar::<u32>())
            .map_err(|e| engine_err("sample", e))?;

        if next_token == eot_token {
            break;
        }

        tokens.push(next_token);

        if let Some(piece) = tokenizer.id_to_token(next_token) {
            decoded_text.push_str(&piece.replace("Ġ", " ").replace("▁", " "));
        }
    }

    model.reset_kv_cache();

    Ok(decoded_text.trim().to_string())
}

fn load_err(stage: &str, e: impl fmt::Display) -> TranscriptionError {
    TranscriptionError::ModelLoadFailed(format!("{}: {}", stage, e))
}

fn engine_err(stage: &str, e: impl fmt::Display) -> TranscriptionError {
    TranscriptionError::EngineFailed(format!("{}: {}", stage, e))
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, TranscriptionError> {
    tokenizer
        .token_to_id(token)
        .ok_or_else(|| TranscriptionError::EngineFailed(format!("token not found: {}", token)))
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    let filters: Vec<f32> = bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(filters)
}
