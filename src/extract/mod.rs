pub mod bridge;
pub mod inputs;
pub mod orchestrator;
pub mod process;
pub mod tesseract;

pub use bridge::ScriptExtractor;
pub use inputs::{collect_inputs, InputItem};
pub use orchestrator::{ExtractionOrchestrator, ProcessingStrategy};
pub use tesseract::TesseractExtractor;

use anyhow::Result;
use std::path::Path;

/// A recognition engine: turns one image into raw text.
///
/// Engine setup (binary lookup, model paths) belongs in the constructor so a
/// single instance can be reused, and shared across worker threads, for a
/// whole run.
pub trait Extractor: Send + Sync {
    /// Name used to key this engine's result set.
    fn name(&self) -> &str;

    fn extract(&self, image: &Path) -> Result<String>;
}

impl<E: Extractor + ?Sized> Extractor for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self, image: &Path) -> Result<String> {
        (**self).extract(image)
    }
}
