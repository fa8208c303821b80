use serde::Serialize;

use super::backend_kind::BackendKind;

/// A timed span of transcribed text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One backend's answer for one audio asset, as assembled by the
/// orchestrator. Immutable once produced; an empty `text` is a valid
/// no-speech outcome, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct Transcription {
    pub text: String,
    pub language: String,
    pub segments: Vec<Segment>,
    /// Engine-reported time spent transcribing, in seconds.
    pub transcription_time_secs: f64,
    /// Wall-clock time measured around the backend call by the caller.
    pub wall_time_secs: f64,
    /// Precomputed once per asset; identical across backends so that
    /// speed ratios are comparable.
    pub audio_duration_secs: f64,
    pub backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Transcription {
    pub fn speed_ratio(&self) -> f64 {
        speed_ratio(self.audio_duration_secs, self.transcription_time_secs)
    }
}

/// Audio duration divided by transcription time. Defined as 0 (never
/// NaN or infinity) when the transcription time is zero.
pub fn speed_ratio(audio_duration_secs: f64, transcription_time_secs: f64) -> f64 {
    if transcription_time_secs > 0.0 {
        audio_duration_secs / transcription_time_secs
    } else {
        0.0
    }
}
