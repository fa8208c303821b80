/// How the tracing subscriber should be set up for a binary.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    /// Default filter directive when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
            default_filter: "info,voxlab=debug,tower_http=debug".to_string(),
        }
    }
}
