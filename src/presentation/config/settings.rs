use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub whisper: WhisperSettings,
    #[serde(default)]
    pub cloud: CloudSettings,
    #[serde(default)]
    pub relay: RelaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Layer an optional `appsettings.{environment}` file under `APP_`-
    /// prefixed environment variables; everything has a working default.
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string());

        let configuration = Config::builder()
            .add_source(File::with_name(&format!("appsettings.{}", environment)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhisperSettings {
    /// Whisper model size: tiny, base, small, medium, or large.
    #[serde(default = "default_model_size")]
    pub model_size: String,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            model_size: default_model_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CloudSettings {
    /// Subscription key; when absent here, `AZURE_SPEECH_KEY` is consulted.
    pub key: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    /// Full URL of the external recognition server's transcribe endpoint.
    pub endpoint: Option<String>,
    #[serde(default = "default_relay_timeout")]
    pub timeout_secs: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_relay_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            enable_json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5002
}

fn default_model_size() -> String {
    "base".to_string()
}

fn default_relay_timeout() -> u64 {
    crate::infrastructure::backends::DEFAULT_RELAY_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}
