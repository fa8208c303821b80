mod batch_processor;
mod comparison_engine;
mod orchestrator;

pub use batch_processor::{BatchError, BatchProcessor, SUPPORTED_EXTENSIONS};
pub use comparison_engine::ComparisonEngine;
pub use orchestrator::TranscriptionOrchestrator;
