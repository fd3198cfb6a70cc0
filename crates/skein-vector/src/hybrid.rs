//! Reciprocal Rank Fusion of dense and sparse result lists.
//!
//! # Algorithm
//!
//! RRF score for item `d`: `score(d) = Σ 1/(k + rank_i(d))`
//!
//! Where `rank_i(d)` is the 0-based rank of `d` in result list `i`, and `k`
//! is a smoothing constant ([`RRF_K`]) that controls how much weight is given
//! to lower-ranked items. Only ranks matter; the input scores are ignored.
//!
//! Items with equal fused scores keep their order of first appearance,
//! scanning the dense list before the sparse list.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Fixed RRF smoothing constant.
pub const RRF_K: usize = 60;

/// Which input list(s) a fused item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionSource {
    /// Dense list only.
    Dense,
    /// Sparse list only.
    Sparse,
    /// Both lists.
    Both,
}

impl fmt::Display for FusionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dense => "dense",
            Self::Sparse => "sparse",
            Self::Both => "both",
        })
    }
}

/// A fused result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    /// Entity identifier.
    pub id: String,

    /// Combined RRF score (higher is better).
    pub score: f32,

    /// Provenance of the item.
    pub source: FusionSource,
}

/// Merge dense and sparse rankings using Reciprocal Rank Fusion.
///
/// # Arguments
///
/// * `dense` - `(id, score)` pairs from dense search, best first
/// * `sparse` - `(id, score)` pairs from sparse search, best first
/// * `limit` - Maximum results to return
/// * `k` - RRF constant (normally [`RRF_K`])
///
/// Items appearing in both lists accumulate both contributions and are
/// returned once.
pub fn reciprocal_rank_fusion(
    dense: &[(String, f32)],
    sparse: &[(String, f32)],
    limit: usize,
    k: usize,
) -> Vec<FusedResult> {
    // (id, source, running sum); sums stay f64 until output
    let mut fused: Vec<(&str, FusionSource, f64)> = Vec::with_capacity(dense.len() + sparse.len());
    let mut positions: HashMap<&str, usize> = HashMap::new();

    let lists = [(dense, FusionSource::Dense), (sparse, FusionSource::Sparse)];
    for (list, source) in lists {
        for (rank, (id, _)) in list.iter().enumerate() {
            let contribution = 1.0 / (rank + k) as f64;
            match positions.get(id.as_str()) {
                Some(&pos) => {
                    let entry = &mut fused[pos];
                    entry.2 += contribution;
                    if entry.1 != source {
                        entry.1 = FusionSource::Both;
                    }
                }
                None => {
                    positions.insert(id.as_str(), fused.len());
                    fused.push((id.as_str(), source, contribution));
                }
            }
        }
    }

    // sort_by is stable, so ties keep first-appearance order
    fused.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    fused
        .into_iter()
        .take(limit)
        .map(|(id, source, score)| FusedResult {
            id: id.to_string(),
            score: score as f32,
            source,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
