use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use voxlab::application::ports::TranscriptionBackend;
use voxlab::application::services::{ComparisonEngine, TranscriptionOrchestrator};
use voxlab::infrastructure::audio::FallbackAudioDecoder;
use voxlab::infrastructure::backends::{
    CloudSpeechBackend, CloudSpeechConfig, LocalWhisperBackend, RelayBackend,
};
use voxlab::infrastructure::observability::{init_tracing, TracingConfig};
use voxlab::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;

    init_tracing(TracingConfig {
        json_format: settings.logging.enable_json,
        default_filter: format!(
            "{},voxlab=debug,tower_http=debug",
            settings.logging.level
        ),
        ..TracingConfig::default()
    });

    let model_size = settings
        .whisper
        .model_size
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let cloud_config = match (&settings.cloud.key, &settings.cloud.region) {
        (Some(key), region) if !key.is_empty() => Some(CloudSpeechConfig::new(
            key.clone(),
            region.clone().unwrap_or_else(|| "eastus".to_string()),
        )),
        _ => CloudSpeechConfig::from_env(),
    };
    if cloud_config.is_none() {
        tracing::warn!("Cloud speech not configured; its results will be NotConfigured entries");
    }
    if settings.relay.endpoint.is_none() {
        tracing::warn!("Relay endpoint not configured; its results will be NotConfigured entries");
    }

    let local = Arc::new(LocalWhisperBackend::new(model_size));
    let cloud = Arc::new(CloudSpeechBackend::new(cloud_config));
    let relay = Arc::new(RelayBackend::new(
        settings.relay.endpoint.clone(),
        settings.relay.timeout_secs,
    ));

    let backends: Vec<Arc<dyn TranscriptionBackend>> =
        vec![local.clone(), cloud.clone(), relay.clone()];

    let orchestrator = TranscriptionOrchestrator::new();
    let state = AppState {
        decoder: Arc::new(FallbackAudioDecoder::new()),
        backends,
        local,
        orchestrator,
        comparison: Arc::new(ComparisonEngine::new(orchestrator)),
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!(model = %model_size, "Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
