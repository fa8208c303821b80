use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three interchangeable speech-recognition backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    LocalWhisper,
    CloudSpeech,
    Relay,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::LocalWhisper,
        BackendKind::CloudSpeech,
        BackendKind::Relay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::LocalWhisper => "local_whisper",
            BackendKind::CloudSpeech => "cloud_speech",
            BackendKind::Relay => "relay",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "local_whisper" | "whisper" => Ok(BackendKind::LocalWhisper),
            "cloud" | "cloud_speech" | "azure" => Ok(BackendKind::CloudSpeech),
            "relay" => Ok(BackendKind::Relay),
            other => Err(format!(
                "Unknown backend: {}. Expected: local, cloud, or relay",
                other
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
