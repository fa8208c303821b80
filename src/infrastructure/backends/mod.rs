mod cloud_speech;
mod local_whisper;
mod relay;

pub use cloud_speech::{CloudSpeechBackend, CloudSpeechConfig};
pub use local_whisper::{LocalWhisperBackend, ModelSize};
pub use relay::{RelayBackend, DEFAULT_RELAY_TIMEOUT_SECS};
