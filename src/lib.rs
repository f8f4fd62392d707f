pub mod consensus;
pub mod core;
pub mod extract;
pub mod pipeline;
pub mod store;

pub use consensus::{select_best, text_similarity, ConsensusEngine};
pub use crate::core::model::{ConsensusResult, ExtractionResult, ResultSet, Selection};
pub use crate::core::{ConsensusError, Result};
pub use extract::{ExtractionOrchestrator, Extractor};
pub use store::ResultStore;
