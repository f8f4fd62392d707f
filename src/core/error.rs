//! Error types shared by the extraction and consensus stages.
//!
//! Every variant is fatal to the run that raised it. Variants carry the
//! engine name, item id or path needed to diagnose the failure.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsensusError>;

#[derive(Error, Debug)]
pub enum ConsensusError {
    /// A recognition engine failed or timed out on one item.
    #[error("engine '{engine}' failed on '{item_id}'")]
    Extraction {
        engine: String,
        item_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Result sets being reconciled do not describe the same items.
    #[error("result sets do not correspond: {message}")]
    Correspondence { message: String },

    /// No candidate texts were available for an item.
    #[error("no candidates to choose from{}", item_suffix(.item_id))]
    InsufficientCandidates { item_id: Option<String> },

    /// Reading, writing or decoding a persisted file failed.
    #[error("persistence failure at {}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The input directory could not be enumerated.
    #[error("cannot list input directory {}", .path.display())]
    InputCollection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration: {message}")]
    Config { message: String },
}

fn item_suffix(item_id: &Option<String>) -> String {
    match item_id {
        Some(id) => format!(" for '{id}'"),
        None => String::new(),
    }
}

impl ConsensusError {
    pub fn correspondence(message: impl Into<String>) -> Self {
        Self::Correspondence {
            message: message.into(),
        }
    }

    pub fn persistence(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = ConsensusError::Extraction {
            engine: "tesseract".to_string(),
            item_id: "7.jpg".to_string(),
            source: anyhow::anyhow!("exit status 1").into(),
        };
        assert_eq!(err.to_string(), "engine 'tesseract' failed on '7.jpg'");

        let err = ConsensusError::InsufficientCandidates {
            item_id: Some("a.jpg".to_string()),
        };
        assert_eq!(err.to_string(), "no candidates to choose from for 'a.jpg'");
        let err = ConsensusError::InsufficientCandidates { item_id: None };
        assert_eq!(err.to_string(), "no candidates to choose from");
    }
}
