pub mod error;
pub mod model;

pub use error::{ConsensusError, Result};
pub use model::{ConsensusResult, ExtractionResult, ResultSet, Selection};
