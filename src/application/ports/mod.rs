mod audio_decoder;
mod transcription_backend;

pub use audio_decoder::{AudioDecoder, DecodeError};
pub use transcription_backend::{BackendTranscript, TranscriptionBackend, TranscriptionError};
