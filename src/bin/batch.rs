use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use voxlab::application::ports::TranscriptionBackend;
use voxlab::application::services::{BatchProcessor, TranscriptionOrchestrator};
use voxlab::domain::BackendKind;
use voxlab::infrastructure::audio::FallbackAudioDecoder;
use voxlab::infrastructure::backends::{
    CloudSpeechBackend, CloudSpeechConfig, LocalWhisperBackend, ModelSize, RelayBackend,
};
use voxlab::infrastructure::observability::{init_tracing, TracingConfig};
use voxlab::presentation::Settings;

/// Transcribe every supported audio file in a directory.
#[derive(Parser)]
#[command(name = "voxlab-batch")]
struct Cli {
    /// Directory containing audio files.
    input_dir: PathBuf,

    /// Directory for result artifacts.
    #[arg(long, default_value = "transcriptions")]
    output_dir: PathBuf,

    /// Language hint (e.g. 'en', 'es', 'fr').
    #[arg(long)]
    language: Option<String>,

    /// Backend: local, cloud, or relay.
    #[arg(long, default_value = "local")]
    backend: BackendKindArg,

    /// Whisper model size for the local backend.
    #[arg(long, default_value = "base")]
    model: ModelSizeArg,
}

#[derive(Clone)]
struct BackendKindArg(BackendKind);

impl std::str::FromStr for BackendKindArg {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(BackendKindArg)
    }
}

#[derive(Clone)]
struct ModelSizeArg(ModelSize);

impl std::str::FromStr for ModelSizeArg {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(ModelSizeArg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(TracingConfig::default());

    let settings = Settings::load().unwrap_or_default();

    // Upfront configuration failures exit non-zero; per-file failures
    // inside the batch never do.
    let backend: Arc<dyn TranscriptionBackend> = match cli.backend.0 {
        BackendKind::LocalWhisper => Arc::new(LocalWhisperBackend::new(cli.model.0)),
        BackendKind::CloudSpeech => {
            let config = match (&settings.cloud.key, &settings.cloud.region) {
                (Some(key), region) if !key.is_empty() => Some(CloudSpeechConfig::new(
                    key.clone(),
                    region.clone().unwrap_or_else(|| "eastus".to_string()),
                )),
                _ => CloudSpeechConfig::from_env(),
            };
            let Some(config) = config else {
                eprintln!(
                    "Cloud speech is not configured. Set AZURE_SPEECH_KEY and AZURE_SPEECH_REGION."
                );
                process::exit(2);
            };
            Arc::new(CloudSpeechBackend::new(Some(config)))
        }
        BackendKind::Relay => {
            let Some(endpoint) = settings.relay.endpoint.clone() else {
                eprintln!("Relay endpoint is not configured. Set APP_RELAY__ENDPOINT.");
                process::exit(2);
            };
            Arc::new(RelayBackend::new(
                Some(endpoint),
                settings.relay.timeout_secs,
            ))
        }
    };

    let processor = BatchProcessor::new(
        Arc::new(FallbackAudioDecoder::new()),
        TranscriptionOrchestrator::new(),
    );

    let job = processor
        .run(
            &cli.input_dir,
            &cli.output_dir,
            cli.language.as_deref(),
            backend.as_ref(),
        )
        .await?;

    println!(
        "Batch finished: {} succeeded, {} failed, artifacts in {}",
        job.successes(),
        job.failures(),
        job.output_dir.display()
    );
    for item in &job.items {
        match &item.outcome {
            Ok(t) => println!("  ok   {} ({:.2}s audio)", item.filename, t.audio_duration_secs),
            Err(e) => println!("  fail {} ({})", item.filename, e),
        }
    }

    // Per-file failures are part of a normal summary; the process still
    // exits 0.
    Ok(())
}
