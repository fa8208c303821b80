mod settings;

pub use settings::{
    CloudSettings, LoggingSettings, RelaySettings, ServerSettings, Settings, WhisperSettings,
};
