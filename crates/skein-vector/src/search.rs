//! Vector search engine.
//!
//! Ranks an externally supplied candidate scope against a query using one of
//! three strategies:
//!
//! - **dense**: cosine similarity of the query embedding against each
//!   candidate's dense vector, via the native index when one is configured
//! - **sparse**: dot product over shared terms of the sparse vectors
//! - **hybrid**: both of the above with a doubled `top_k`, merged by
//!   [`reciprocal_rank_fusion`]
//!
//! The engine never widens or narrows the scope. Search is read-only; a
//! concurrent write to a candidate may or may not be observed.

use skein_core::Result;
use std::sync::Arc;
use std::time::Instant;

use crate::entity::VectorEntity;
use crate::hybrid::{RRF_K, reciprocal_rank_fusion};
use crate::index::{NativeVectorIndex, ScopeFilter};
use crate::service::EmbeddingService;
use crate::similarity::{cosine_similarity, shares_term, sparse_dot};
use crate::types::{ResolvedQuery, SearchConfig, SearchQuery, SearchResult, SearchStrategy};

/// Multi-strategy search over a candidate scope.
pub struct VectorSearchEngine {
    service: Arc<EmbeddingService>,
    native_index: Option<Arc<dyn NativeVectorIndex>>,
    config: SearchConfig,
}

impl VectorSearchEngine {
    /// Create an engine that brute-forces dense search.
    pub fn new(service: Arc<EmbeddingService>, config: SearchConfig) -> Self {
        Self {
            service,
            native_index: None,
            config,
        }
    }

    /// Use `index` for dense nearest-neighbor queries.
    pub fn with_native_index(mut self, index: Arc<dyn NativeVectorIndex>) -> Self {
        self.native_index = Some(index);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Rank `scope` against `query`.
    ///
    /// An empty scope yields an empty result for every strategy without
    /// touching the backend.
    ///
    /// # Errors
    ///
    /// Returns [`skein_core::Error::InvalidQuery`] for an invalid `top_k` or
    /// threshold, and propagates backend failures. In hybrid mode a failure
    /// of either sub-search fails the whole call.
    pub async fn search<E: VectorEntity>(
        &self,
        query: &SearchQuery,
        scope: &[E],
    ) -> Result<SearchResult> {
        let query = query.resolve(&self.config)?;

        if scope.is_empty() {
            log::debug!("{} search over empty scope", query.strategy);
            return Ok(SearchResult::empty(query.strategy));
        }

        let start = Instant::now();
        let ranked = match query.strategy {
            SearchStrategy::Dense => self.dense(&query, scope, query.top_k).await?,
            SearchStrategy::Sparse => self.sparse(&query, scope, query.top_k),
            SearchStrategy::Hybrid => self.hybrid(&query, scope).await?,
        };
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::debug!(
            "{} search over {} candidates returned {} items in {elapsed_ms:.2}ms",
            query.strategy,
            scope.len(),
            ranked.len()
        );

        Ok(SearchResult::from_ranked(query.strategy, ranked).with_execution_time_ms(elapsed_ms))
    }

    async fn dense<E: VectorEntity>(
        &self,
        query: &ResolvedQuery,
        scope: &[E],
        top_k: usize,
    ) -> Result<Vec<(String, f32)>> {
        let query_vector = self.service.embed(&query.text, None).await?;

        if let Some(index) = &self.native_index {
            let filter = ScopeFilter::from_entities(scope);
            log::debug!("dense search via native index {}", index.name());
            return index
                .nearest_neighbors(&query_vector, &filter, top_k, query.threshold)
                .await;
        }

        let mut scored: Vec<(String, f32)> = scope
            .iter()
            .filter_map(|entity| {
                let dense = entity.vectors().dense.as_ref()?;
                let score = cosine_similarity(&query_vector, dense);
                (score > query.threshold).then(|| (entity.entity_id().to_string(), score))
            })
            .collect();

        sort_descending(&mut scored);
        scored.truncate(top_k);
        Ok(scored)
    }

    fn sparse<E: VectorEntity>(
        &self,
        query: &ResolvedQuery,
        scope: &[E],
        top_k: usize,
    ) -> Vec<(String, f32)> {
        let query_terms = self.service.generate_sparse_embedding(&query.text);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(String, f32)> = scope
            .iter()
            .filter_map(|entity| {
                let sparse = entity.vectors().sparse.as_ref()?;
                if !shares_term(&query_terms, sparse) {
                    return None;
                }
                let score = sparse_dot(&query_terms, sparse);
                (score > 0.0).then(|| (entity.entity_id().to_string(), score))
            })
            .collect();

        sort_descending(&mut scored);
        scored.truncate(top_k);
        scored
    }

    async fn hybrid<E: VectorEntity>(
        &self,
        query: &ResolvedQuery,
        scope: &[E],
    ) -> Result<Vec<(String, f32)>> {
        let inner_k = query.top_k.saturating_mul(2);
        let dense = self.dense(query, scope, inner_k).await?;
        let sparse = self.sparse(query, scope, inner_k);

        log::debug!(
            "fusing {} dense and {} sparse candidates",
            dense.len(),
            sparse.len()
        );

        Ok(reciprocal_rank_fusion(&dense, &sparse, query.top_k, RRF_K)
            .into_iter()
            .map(|fused| (fused.id, fused.score))
            .collect())
    }
}

/// Sort by score, best first; ties keep scope order.
fn sort_descending(scored: &mut [(String, f32)]) {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

impl std::fmt::Debug for VectorSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorSearchEngine")
            .field("service", &self.service)
            .field("native_index", &self.native_index.as_ref().map(|i| i.name()))
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
