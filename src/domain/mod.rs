mod audio_asset;
mod backend_kind;
mod batch;
mod comparison;
mod transcription;

pub use audio_asset::{extension_of, AudioAsset, DecodeStrategyKind, TARGET_SAMPLE_RATE};
pub use backend_kind::BackendKind;
pub use batch::{BatchItem, BatchItemError, BatchJob};
pub use comparison::{ComparisonEntry, ComparisonRecord, FailureKind};
pub use transcription::{speed_ratio, Segment, Transcription};
