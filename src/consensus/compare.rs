use unicode_normalization::UnicodeNormalization;

/// Normalized Indel similarity in `[0, 1]`.
///
/// `1 - indel(a, b) / max(len(a) + len(b), 1)`, where `indel` counts only
/// insertions and deletions (a substitution costs 2), so strings with no
/// characters in common score 0.0 and identical strings, including two empty
/// strings, score 1.0. Lengths are counted in Unicode scalar values.
///
/// Both inputs are NFC-normalized first. Text stored in decomposed form
/// (e.g. `e` + U+0301) therefore scores as its precomposed equivalent, which
/// differs from a ratio taken over the raw code points.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.nfc().collect();
    let b: Vec<char> = b.nfc().collect();
    if a == b {
        return 1.0;
    }

    let total = a.len() + b.len();
    let distance = total - 2 * lcs_len(&a, &b);
    (1.0 - distance as f64 / total.max(1) as f64).clamp(0.0, 1.0)
}

/// Length of the longest common subsequence, single-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];
    for &ca in long {
        let mut diag = 0;
        for (j, &cb) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[short.len()]
}
