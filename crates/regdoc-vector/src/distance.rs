//! Vector math for the index hot path. Callers guarantee equal lengths.

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn magnitude(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// Unit-length copy of `v`, or `None` when `v` has zero or non-finite norm.
pub fn normalized(v: &[f32]) -> Option<Vec<f32>> {
    let norm = magnitude(v);
    if !norm.is_finite() || norm <= 0.0 {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}
