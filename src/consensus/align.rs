use std::collections::HashMap;

use tracing::warn;

use crate::core::{ConsensusError, ResultSet, Result};

/// All engines' candidates for one item, in engine order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedItem {
    pub item_id: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub engines: Vec<String>,
    pub items: Vec<AlignedItem>,
}

/// Checks that every result set describes the same items and joins them by
/// item id, in the order of the first set.
pub fn align_result_sets(sets: &[ResultSet]) -> Result<AlignmentResult> {
    let reference = sets
        .first()
        .ok_or(ConsensusError::InsufficientCandidates { item_id: None })?;
    let reference_index = index_by_id(reference)?;

    let mut lookups = Vec::with_capacity(sets.len());
    for set in sets {
        if set.len() != reference.len() {
            return Err(ConsensusError::correspondence(format!(
                "engine '{}' has {} items but '{}' has {}",
                reference.engine,
                reference.len(),
                set.engine,
                set.len()
            )));
        }

        let index = index_by_id(set)?;
        for (pos, item_id) in set.item_ids().enumerate() {
            if !reference_index.contains_key(item_id) {
                return Err(ConsensusError::correspondence(format!(
                    "position {pos}: '{}' from '{}' vs '{item_id}' from '{}'",
                    reference.results[pos].item_id, reference.engine, set.engine
                )));
            }
        }

        if !set.item_ids().eq(reference.item_ids()) {
            warn!(
                engine = %set.engine,
                reference = %reference.engine,
                "item order differs, joining by item id"
            );
        }
        lookups.push(index);
    }

    let items = reference
        .results
        .iter()
        .map(|result| AlignedItem {
            item_id: result.item_id.clone(),
            candidates: sets
                .iter()
                .zip(&lookups)
                .map(|(set, index)| set.results[index[result.item_id.as_str()]].text.clone())
                .collect(),
        })
        .collect();

    Ok(AlignmentResult {
        engines: sets.iter().map(|set| set.engine.clone()).collect(),
        items,
    })
}

fn index_by_id(set: &ResultSet) -> Result<HashMap<&str, usize>> {
    let mut index = HashMap::with_capacity(set.len());
    for (pos, item_id) in set.item_ids().enumerate() {
        if let Some(first) = index.insert(item_id, pos) {
            return Err(ConsensusError::correspondence(format!(
                "engine '{}' lists '{item_id}' twice (positions {first} and {pos})",
                set.engine
            )));
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExtractionResult;
    use pretty_assertions::assert_eq;

    fn set(engine: &str, items: &[(&str, &str)]) -> ResultSet {
        ResultSet::new(
            engine,
            items
                .iter()
                .map(|(id, text)| ExtractionResult::new(*id, *text))
                .collect(),
        )
    }

    #[test]
    fn rejects_unequal_lengths() {
        let a = set("a", &[("1.jpg", "x"), ("2.jpg", "y"), ("3.jpg", "z")]);
        let b = set("b", &[("1.jpg", "x"), ("2.jpg", "y")]);
        let err = align_result_sets(&[a, b]).unwrap_err();
        assert!(matches!(err, ConsensusError::Correspondence { .. }));
    }

    #[test]
    fn rejects_mismatched_item_ids() {
        let a = set("a", &[("a.jpg", "x"), ("b.jpg", "y")]);
        let b = set("b", &[("a.jpg", "x"), ("c.jpg", "y")]);
        let err = align_result_sets(&[a, b]).unwrap_err();
        match err {
            ConsensusError::Correspondence { message } => {
                assert!(message.contains("b.jpg"));
                assert!(message.contains("c.jpg"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let a = set("a", &[("a.jpg", "x"), ("a.jpg", "y")]);
        let b = set("b", &[("a.jpg", "x"), ("b.jpg", "y")]);
        assert!(matches!(
            align_result_sets(&[a, b]),
            Err(ConsensusError::Correspondence { .. })
        ));
    }

    #[test]
    fn joins_reordered_sets_by_item_id() {
        let a = set("a", &[("1.jpg", "one-a"), ("2.jpg", "two-a")]);
        let b = set("b", &[("2.jpg", "two-b"), ("1.jpg", "one-b")]);
        let aligned = align_result_sets(&[a, b]).unwrap();
        assert_eq!(aligned.engines, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            aligned.items,
            vec![
                AlignedItem {
                    item_id: "1.jpg".to_string(),
                    candidates: vec!["one-a".to_string(), "one-b".to_string()],
                },
                AlignedItem {
                    item_id: "2.jpg".to_string(),
                    candidates: vec!["two-a".to_string(), "two-b".to_string()],
                },
            ]
        );
    }

    #[test]
    fn requires_at_least_one_set() {
        assert!(matches!(
            align_result_sets(&[]),
            Err(ConsensusError::InsufficientCandidates { .. })
        ));
    }
}
