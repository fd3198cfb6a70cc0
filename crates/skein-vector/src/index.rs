//! Native nearest-neighbor index seam.
//!
//! A storage layer that can answer nearest-neighbor queries itself plugs in
//! here. The search engine uses it opportunistically for dense search; when
//! none is configured it falls back to brute-force cosine over the scope.

use async_trait::async_trait;
use skein_core::Result;
use std::collections::HashSet;
use tokio::sync::RwLock;

use crate::entity::VectorEntity;
use crate::similarity::cosine_similarity;

/// The set of entity ids a query may return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    ids: HashSet<String>,
}

impl ScopeFilter {
    /// Build a filter admitting exactly the entities in `scope`.
    pub fn from_entities<E: VectorEntity>(scope: &[E]) -> Self {
        Self {
            ids: scope.iter().map(|e| e.entity_id().to_string()).collect(),
        }
    }

    /// Whether `id` is in scope.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of ids in scope.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the scope is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A store that can rank its own vectors by cosine similarity.
#[async_trait]
pub trait NativeVectorIndex: Send + Sync {
    /// Up to `top_k` in-scope ids with similarity `>= min_similarity`,
    /// best first.
    async fn nearest_neighbors(
        &self,
        query: &[f32],
        scope: &ScopeFilter,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<(String, f32)>>;

    /// The index name for diagnostics.
    fn name(&self) -> &str;
}

/// A flat in-memory index.
///
/// Useful as a reference implementation and in tests; it scores every
/// stored vector on each query.
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    vectors: RwLock<Vec<(String, Vec<f32>)>>,
}

impl MemoryVectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the dense vectors of `entities`; entities without one are skipped.
    pub async fn index_entities<E: VectorEntity>(&self, entities: &[E]) -> usize {
        let mut vectors = self.vectors.write().await;
        let before = vectors.len();
        for entity in entities {
            if let Some(dense) = entity.vectors().dense.as_ref() {
                vectors.retain(|(id, _)| id != entity.entity_id());
                vectors.push((entity.entity_id().to_string(), dense.clone()));
            }
        }
        vectors.len().saturating_sub(before)
    }

    /// Number of indexed vectors.
    pub async fn len(&self) -> usize {
        self.vectors.read().await.len()
    }

    /// Whether nothing is indexed.
    pub async fn is_empty(&self) -> bool {
        self.vectors.read().await.is_empty()
    }
}

#[async_trait]
impl NativeVectorIndex for MemoryVectorIndex {
    async fn nearest_neighbors(
        &self,
        query: &[f32],
        scope: &ScopeFilter,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<(String, f32)>> {
        let vectors = self.vectors.read().await;
        let mut scored: Vec<(String, f32)> = vectors
            .iter()
            .filter(|(id, _)| scope.contains(id))
            .map(|(id, dense)| (id.clone(), cosine_similarity(query, dense)))
            .filter(|(_, score)| *score >= min_similarity)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Tests
// ============================================================================
