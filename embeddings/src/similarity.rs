//! Vector math for comparing embeddings.

use crate::error::{EmbeddingError, Result};

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Euclidean length of a vector.
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// Fails with [`EmbeddingError::ZeroMagnitude`] when either vector is all
/// zeros, since the ratio would be NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    cosine_from_parts(dot, magnitude(a), magnitude(b))
}

/// Cosine similarity from a precomputed dot product and magnitudes.
///
/// Lets callers that compare one vector against many reuse its magnitude.
pub fn cosine_from_parts(dot: f32, magnitude_a: f32, magnitude_b: f32) -> Result<f32> {
    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Err(EmbeddingError::ZeroMagnitude);
    }

    // Rounding can push parallel vectors a hair past 1.0.
    Ok((dot / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0))
}
