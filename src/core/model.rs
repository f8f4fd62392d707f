use serde::{Deserialize, Serialize};

/// One engine's transcription of one image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    #[serde(rename = "image_name", alias = "item_id", alias = "id")]
    pub item_id: String,
    pub text: String,
}

impl ExtractionResult {
    pub fn new(item_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            text: text.into(),
        }
    }
}

/// The ordered output of running one engine over the whole input collection.
///
/// Only `results` is persisted; the engine name is carried by the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    pub engine: String,
    pub results: Vec<ExtractionResult>,
}

impl ResultSet {
    pub fn new(engine: impl Into<String>, results: Vec<ExtractionResult>) -> Self {
        Self {
            engine: engine.into(),
            results,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.item_id.as_str())
    }
}

/// The reconciled text chosen for one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsensusResult {
    #[serde(rename = "image_name", alias = "item_id", alias = "id")]
    pub item_id: String,
    pub text: String,
}

/// Outcome of picking the best-agreement candidate among N texts.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub text: String,
    /// Average similarity of each candidate to all others, in input order.
    pub scores: Vec<f64>,
}

impl Selection {
    pub fn score(&self) -> f64 {
        self.scores[self.index]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateDebug {
    pub engine: String,
    pub text: String,
    pub agreement: f64,
}

/// Per-item breakdown written alongside the consensus output in debug mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemReport {
    #[serde(rename = "image_name")]
    pub item_id: String,
    pub text: String,
    pub engine: String,
    pub agreement: f64,
    pub candidates: Vec<CandidateDebug>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_legacy_and_alias_field_names() {
        let legacy: ExtractionResult =
            serde_json::from_str(r#"{"image_name": "1.jpg", "text": "Hi"}"#).unwrap();
        let short: ExtractionResult =
            serde_json::from_str(r#"{"id": "1.jpg", "text": "Hi"}"#).unwrap();
        assert_eq!(legacy, short);
        assert_eq!(legacy.item_id, "1.jpg");
    }

    #[test]
    fn writes_image_name_field() {
        let json = serde_json::to_string(&ConsensusResult {
            item_id: "a.png".to_string(),
            text: "x".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"image_name":"a.png","text":"x"}"#);
    }
}
