//! Vector similarity functions.

use skein_core::{Error, Result};

use crate::entity::VectorFields;
use crate::types::SparseVector;

/// Cosine similarity between two dense vectors.
///
/// Returns `0.0` when either norm is zero or the lengths differ; vectors of
/// different dimensions are never compared.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Whether two sparse vectors share at least one term.
pub fn shares_term(a: &SparseVector, b: &SparseVector) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.keys().any(|term| large.contains_key(term))
}

/// Dot product over the terms two sparse vectors share.
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum()
}

/// Check that stored vectors agree with an expected dimension.
///
/// Entities without a dense vector pass. A dense vector whose length differs
/// from `expected`, or from its own recorded `dimensions`, fails.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] on the first disagreement.
pub fn validate_dimensions(fields: &VectorFields, expected: usize) -> Result<()> {
    let Some(dense) = fields.dense.as_ref() else {
        return Ok(());
    };

    if let Some(recorded) = fields.dimensions
        && recorded != dense.len()
    {
        return Err(Error::dimension_mismatch(recorded, dense.len()));
    }

    if dense.len() != expected {
        return Err(Error::dimension_mismatch(expected, dense.len()));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
