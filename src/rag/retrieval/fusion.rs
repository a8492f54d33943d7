//! Score normalization and hybrid fusion
//!
//! Dense and sparse scores live on different scales, so each list is
//! min-max normalized to [0, 1] before blending:
//!
//! score(d) = alpha · sparse(d) + (1 − alpha) · dense(d)
//!
//! A document missing from one list contributes 0 for that side.

use std::collections::HashMap;

/// Min-max normalize scores into [0, 1]
///
/// A list whose scores are all equal normalizes to 1.0 for every entry
/// (each is as good as the best match).
///
/// # Complexity
/// O(n)
pub fn normalize(scores: &[(usize, f32)]) -> Vec<(usize, f32)> {
    if scores.is_empty() {
        return Vec::new();
    }

    let (min, max) = scores
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, s)| {
            (lo.min(s), hi.max(s))
        });
    let range = max - min;

    scores
        .iter()
        .map(|&(idx, s)| {
            let normalized = if range > f32::EPSILON {
                (s - min) / range
            } else {
                1.0
            };
            (idx, normalized)
        })
        .collect()
}

/// Relative-score fusion of dense and sparse result lists
///
/// Inputs are `(document index, raw score)` pairs. Output is sorted by
/// descending fused score; ties keep the lower document index first.
///
/// # Complexity
/// O((d + s) log(d + s))
pub fn fuse(dense: &[(usize, f32)], sparse: &[(usize, f32)], alpha: f32) -> Vec<(usize, f32)> {
    let mut combined: HashMap<usize, f32> = HashMap::new();

    for (idx, score) in normalize(dense) {
        *combined.entry(idx).or_insert(0.0) += (1.0 - alpha) * score;
    }
    for (idx, score) in normalize(sparse) {
        *combined.entry(idx).or_insert(0.0) += alpha * score;
    }

    let mut fused: Vec<(usize, f32)> = combined.into_iter().collect();
    fused.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    fused
}
