use crate::consensus::align::AlignedItem;
use crate::core::model::{CandidateDebug, ConsensusResult, ItemReport, Selection};

pub fn to_consensus(item: &AlignedItem, selection: &Selection) -> ConsensusResult {
    ConsensusResult {
        item_id: item.item_id.clone(),
        text: selection.text.clone(),
    }
}

pub fn to_report(engines: &[String], item: &AlignedItem, selection: &Selection) -> ItemReport {
    let candidates = engines
        .iter()
        .zip(&item.candidates)
        .zip(&selection.scores)
        .map(|((engine, text), agreement)| CandidateDebug {
            engine: engine.clone(),
            text: text.clone(),
            agreement: *agreement,
        })
        .collect();

    ItemReport {
        item_id: item.item_id.clone(),
        text: selection.text.clone(),
        engine: engines[selection.index].clone(),
        agreement: selection.score(),
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_names_winning_engine() {
        let engines = vec!["easyocr".to_string(), "tesseract".to_string()];
        let item = AlignedItem {
            item_id: "1.jpg".to_string(),
            candidates: vec!["a".to_string(), "b".to_string()],
        };
        let selection = Selection {
            index: 1,
            text: "b".to_string(),
            scores: vec![0.25, 0.75],
        };

        let report = to_report(&engines, &item, &selection);
        assert_eq!(report.engine, "tesseract");
        assert_eq!(report.agreement, 0.75);
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.candidates[0].engine, "easyocr");
        assert_eq!(report.candidates[0].agreement, 0.25);
    }
}
