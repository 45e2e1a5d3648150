//! Vector operations for embeddings.
//!
//! Inputs are `f32` slices as returned by embedding providers; all accumulation and results are
//! `f64` so that scores are stable across long vectors.

use crate::{Error, ErrorContext, Result};

pub type Vector = Vec<f32>;

fn ensure_same_length(a: &[f32], b: &[f32], op: &str) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::invalid_argument_with_context(
            format!("Vector dimensions must match: {} != {}", a.len(), b.len()),
            ErrorContext::new().with_source(op.to_string()),
        ));
    }
    Ok(())
}

pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f64> {
    ensure_same_length(a, b, "dot_product")?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum())
}

pub fn magnitude(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`.
///
/// Vectors of different length are rejected with `InvalidArgument`, and a zero vector on either
/// side is rejected with `ZeroMagnitude`; this never returns NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    ensure_same_length(a, b, "cosine_similarity")?;
    let mut dot = 0.0f64;
    let mut sq_a = 0.0f64;
    let mut sq_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        sq_a += x * x;
        sq_b += y * y;
    }
    if sq_a == 0.0 || sq_b == 0.0 {
        return Err(Error::zero_magnitude(
            "Cosine similarity is undefined for a zero-magnitude vector",
        ));
    }
    Ok(dot / (sq_a.sqrt() * sq_b.sqrt()))
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f64> {
    ensure_same_length(a, b, "euclidean_distance")?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
        .sum::<f64>()
        .sqrt())
}

/// Rank `candidates` by cosine similarity to `query` and keep the best `k`.
///
/// The sort is stable, so candidates with equal scores keep their input order.
pub fn top_k_cosine_similarities<I, K, V>(query: &[f32], candidates: I, k: usize) -> Result<Vec<(String, f64)>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<[f32]>,
{
    let mut scores = Vec::new();
    for (id, vector) in candidates {
        let score = cosine_similarity(query, vector.as_ref())?;
        scores.push((id.into(), score));
    }
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(k);
    Ok(scores)
}

/// Element-wise mean of a set of vectors, used to collapse a document's chunk embeddings.
pub fn average_vectors<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Vector> {
    let first = vectors
        .first()
        .ok_or_else(|| Error::invalid_argument("Cannot average empty list"))?;
    let dim = first.as_ref().len();
    if !vectors.iter().all(|v| v.as_ref().len() == dim) {
        return Err(Error::invalid_argument("All vectors must have same dimensions"));
    }
    let n = vectors.len() as f64;
    let mut sums = vec![0.0f64; dim];
    for v in vectors {
        for (i, val) in v.as_ref().iter().enumerate() {
            sums[i] += f64::from(*val);
        }
    }
    Ok(sums.into_iter().map(|s| (s / n) as f32).collect())
}
