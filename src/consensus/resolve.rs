use crate::consensus::compare::text_similarity;
use crate::core::{ConsensusError, Result, Selection};

/// Picks the candidate with the highest average similarity to all others.
///
/// Ties go to the earliest candidate. This is a heuristic: when the engines
/// have no majority, the text closest on average to the rest still wins, so
/// the result is an approximation rather than a guarantee of correctness.
pub fn select_best<S: AsRef<str>>(candidates: &[S]) -> Result<Selection> {
    let n = candidates.len();
    match n {
        0 => return Err(ConsensusError::InsufficientCandidates { item_id: None }),
        1 => {
            return Ok(Selection {
                index: 0,
                text: candidates[0].as_ref().to_string(),
                scores: vec![1.0],
            })
        }
        _ => {}
    }

    let mut totals = vec![0.0_f64; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let score = text_similarity(candidates[i].as_ref(), candidates[j].as_ref());
            totals[i] += score;
            totals[j] += score;
        }
    }

    let denom = (n - 1) as f64;
    let scores: Vec<f64> = totals.into_iter().map(|total| total / denom).collect();

    let mut best = 0;
    for (idx, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = idx;
        }
    }

    Ok(Selection {
        index: best,
        text: candidates[best].as_ref().to_string(),
        scores,
    })
}
