mod compare;
mod health;
mod transcribe;
mod upload;

pub use compare::{compare_handler, CompareResponse};
pub use health::health_handler;
pub use transcribe::{transcribe_handler, TranscribeResponse};
pub use upload::ErrorResponse;
