//! Aggregate score statistics.

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Largest score, or `None` for an empty slice.
pub fn highest(scores: &[f64]) -> Option<f64> {
    scores.iter().copied().reduce(f64::max)
}
