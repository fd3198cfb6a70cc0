//! Common types for the retrieval engine.
//!
//! These types are shared by the embedding service, the writers and the
//! search engine, and are always available regardless of feature flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::entity::VectorEntity;

/// Sparse term → weight map.
///
/// A `BTreeMap` keeps iteration and serialization order stable, which the
/// encoder's determinism guarantee relies on.
pub type SparseVector = BTreeMap<String, f32>;

// ============================================================================
// Configuration
// ============================================================================

/// Embedding configuration.
///
/// Controls the default model, caching and backend batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model used when a call site does not name one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Whether the embedding cache is consulted and populated.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Maximum number of texts sent to the backend in a single request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Embedding dimension for backends that cannot report one.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Path to a JSON snapshot of the embedding cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Default similarity threshold (0.0 to 1.0).
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,

    /// Strategy used when the query does not name one.
    #[serde(default)]
    pub default_strategy: SearchStrategy,
}

fn default_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    100
}

fn default_dimension() -> usize {
    384
}

fn default_top_k() -> usize {
    10
}

fn default_threshold() -> f32 {
    0.0
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            cache_enabled: default_true(),
            batch_size: default_batch_size(),
            dimension: default_dimension(),
            cache_path: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            similarity_threshold: default_threshold(),
            default_strategy: SearchStrategy::default(),
        }
    }
}

// ============================================================================
// Embedding records
// ============================================================================

/// A cached embedding, keyed by `(content_hash, model)`.
///
/// Records are immutable once created; regenerating an embedding for the
/// same key replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// BLAKE3 digest of `"{text}::{model}"`.
    pub content_hash: String,

    /// Model that produced the vector.
    pub model: String,

    /// Dense embedding vector.
    pub dense: Vec<f32>,

    /// Length of `dense`.
    pub dimensions: usize,

    /// Sparse term weights, when stored alongside the dense vector.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sparse: SparseVector,

    /// When the vector was generated.
    pub generated_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    /// Create a record for `text` embedded by `model`.
    pub fn new(text: &str, model: &str, dense: Vec<f32>) -> Self {
        Self {
            content_hash: skein_core::content_hash(text, model),
            model: model.to_string(),
            dimensions: dense.len(),
            dense,
            sparse: SparseVector::new(),
            generated_at: Utc::now(),
        }
    }

    /// Attach sparse weights.
    pub fn with_sparse(mut self, sparse: SparseVector) -> Self {
        self.sparse = sparse;
        self
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Search strategy.
///
/// Parsing is lenient: any unrecognised name selects [`SearchStrategy::Hybrid`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchStrategy {
    /// Cosine similarity over dense vectors.
    Dense,
    /// Dot product over shared sparse terms.
    Sparse,
    /// Reciprocal rank fusion of dense and sparse.
    #[default]
    Hybrid,
}

impl SearchStrategy {
    /// Parse a strategy name, falling back to hybrid.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dense" => Self::Dense,
            "sparse" => Self::Sparse,
            _ => Self::Hybrid,
        }
    }

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Sparse => "sparse",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SearchStrategy {
    fn from(name: &str) -> Self {
        Self::parse_lenient(name)
    }
}

impl From<String> for SearchStrategy {
    fn from(name: String) -> Self {
        Self::parse_lenient(&name)
    }
}

impl From<SearchStrategy> for String {
    fn from(strategy: SearchStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

// ============================================================================
// Search types
// ============================================================================

/// Parameters for a search request.
///
/// Unset fields fall back to the engine's [`SearchConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text (embedded and/or sparse-encoded).
    pub text: String,

    /// Maximum results to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    /// Minimum similarity (0.0 to 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,

    /// Strategy to execute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<SearchStrategy>,
}

impl SearchQuery {
    /// Create a query with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the result limit.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: impl Into<SearchStrategy>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Fill unset fields from `config` and check the query invariants.
    ///
    /// # Errors
    ///
    /// Returns [`skein_core::Error::InvalidQuery`] when `top_k` is zero or the
    /// threshold lies outside `[0, 1]`.
    pub fn resolve(&self, config: &SearchConfig) -> skein_core::Result<ResolvedQuery> {
        let top_k = self.top_k.unwrap_or(config.default_top_k);
        let threshold = self.threshold.unwrap_or(config.similarity_threshold);
        let strategy = self.strategy.unwrap_or(config.default_strategy);

        if top_k == 0 {
            return Err(skein_core::Error::invalid_query("top_k must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(skein_core::Error::invalid_query(format!(
                "threshold must be within [0, 1], got {threshold}"
            )));
        }

        Ok(ResolvedQuery {
            text: self.text.clone(),
            top_k,
            threshold,
            strategy,
        })
    }
}

/// A query with every field resolved and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    /// Query text.
    pub text: String,
    /// Maximum results, always greater than zero.
    pub top_k: usize,
    /// Similarity threshold within `[0, 1]`.
    pub threshold: f32,
    /// Strategy to execute.
    pub strategy: SearchStrategy,
}

/// Ranked search output.
///
/// `items` is ordered by descending score and `scores` holds exactly one
/// entry per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Entity identifiers, best first.
    pub items: Vec<String>,

    /// Strategy that produced the ranking.
    pub strategy: SearchStrategy,

    /// Score for each returned item.
    pub scores: HashMap<String, f32>,

    /// Wall-clock time spent in strategy dispatch.
    pub execution_time_ms: f64,
}

impl SearchResult {
    /// Create an empty result.
    pub fn empty(strategy: SearchStrategy) -> Self {
        Self {
            items: Vec::new(),
            strategy,
            scores: HashMap::new(),
            execution_time_ms: 0.0,
        }
    }

    /// Build a result from `(id, score)` pairs already sorted best first.
    ///
    /// Duplicate ids keep their first (highest) score.
    pub fn from_ranked(strategy: SearchStrategy, ranked: Vec<(String, f32)>) -> Self {
        let mut items = Vec::with_capacity(ranked.len());
        let mut scores = HashMap::with_capacity(ranked.len());
        for (id, score) in ranked {
            if scores.contains_key(&id) {
                continue;
            }
            scores.insert(id.clone(), score);
            items.push(id);
        }
        Self {
            items,
            strategy,
            scores,
            execution_time_ms: 0.0,
        }
    }

    /// Set the elapsed time.
    pub fn with_execution_time_ms(mut self, elapsed_ms: f64) -> Self {
        self.execution_time_ms = elapsed_ms;
        self
    }

    /// Number of returned items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Score of a returned item.
    pub fn score(&self, id: &str) -> Option<f32> {
        self.scores.get(id).copied()
    }

    /// Map the returned ids back onto entities from `scope`, in rank order.
    ///
    /// Ids that are not present in `scope` are skipped.
    pub fn resolve<'a, E: VectorEntity>(&self, scope: &'a [E]) -> Vec<&'a E> {
        let by_id: HashMap<&str, &'a E> = scope.iter().map(|e| (e.entity_id(), e)).collect();
        self.items
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::DocumentChunk;

    // ------------------------------------------------------------------------
    // Config tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_embedding_config_default() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.default_model, "bge-small-en-v1.5");
        assert!(config.cache_enabled);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.dimension, 384);
        assert!(config.cache_path.is_none());
    }

    #[test]
    fn test_search_config_default() {
        let config = SearchConfig::default();
        assert_eq!(config.default_top_k, 10);
        assert_eq!(config.similarity_threshold, 0.0);
        assert_eq!(config.default_strategy, SearchStrategy::Hybrid);
    }

    #[test]
    fn test_embedding_config_deserialization_with_defaults() {
        let json = r#"{"cache_enabled": false}"#;
        let config: EmbeddingConfig = serde_json::from_str(json).unwrap();

        assert!(!config.cache_enabled);
        assert_eq!(config.default_model, "bge-small-en-v1.5");
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_search_config_lenient_strategy() {
        let json = r#"{"default_strategy": "semantic-ish"}"#;
        let config: SearchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_strategy, SearchStrategy::Hybrid);

        let json = r#"{"default_strategy": "Sparse"}"#;
        let config: SearchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_strategy, SearchStrategy::Sparse);
    }

    // ------------------------------------------------------------------------
    // Strategy tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_strategy_parse_lenient() {
        assert_eq!(SearchStrategy::parse_lenient("dense"), SearchStrategy::Dense);
        assert_eq!(SearchStrategy::parse_lenient(" SPARSE "), SearchStrategy::Sparse);
        assert_eq!(SearchStrategy::parse_lenient("hybrid"), SearchStrategy::Hybrid);
        assert_eq!(SearchStrategy::parse_lenient("bm25"), SearchStrategy::Hybrid);
        assert_eq!(SearchStrategy::parse_lenient(""), SearchStrategy::Hybrid);
    }

    #[test]
    fn test_strategy_serializes_lowercase() {
        let json = serde_json::to_string(&SearchStrategy::Dense).unwrap();
        assert_eq!(json, "\"dense\"");
        assert_eq!(SearchStrategy::Sparse.to_string(), "sparse");
    }

    // ------------------------------------------------------------------------
    // EmbeddingRecord tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_embedding_record_new() {
        let record = EmbeddingRecord::new("hello", "mini", vec![0.1, 0.2, 0.3]);
        assert_eq!(record.content_hash, skein_core::content_hash("hello", "mini"));
        assert_eq!(record.model, "mini");
        assert_eq!(record.dimensions, 3);
        assert!(record.sparse.is_empty());
    }

    #[test]
    fn test_embedding_record_serialization_skips_empty_sparse() {
        let record = EmbeddingRecord::new("hello", "mini", vec![1.0]);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("sparse"));

        let with_sparse = record.with_sparse(SparseVector::from([("hello".to_string(), 1.0)]));
        let json = serde_json::to_string(&with_sparse).unwrap();
        assert!(json.contains("sparse"));
    }

    // ------------------------------------------------------------------------
    // SearchQuery tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new("cats")
            .with_top_k(5)
            .with_threshold(0.5)
            .with_strategy("sparse");

        assert_eq!(query.text, "cats");
        assert_eq!(query.top_k, Some(5));
        assert_eq!(query.threshold, Some(0.5));
        assert_eq!(query.strategy, Some(SearchStrategy::Sparse));
    }

    #[test]
    fn test_search_query_resolve_uses_defaults() {
        let resolved = SearchQuery::new("cats")
            .resolve(&SearchConfig::default())
            .unwrap();

        assert_eq!(resolved.top_k, 10);
        assert_eq!(resolved.threshold, 0.0);
        assert_eq!(resolved.strategy, SearchStrategy::Hybrid);
    }

    #[test]
    fn test_search_query_resolve_rejects_zero_top_k() {
        let err = SearchQuery::new("cats")
            .with_top_k(0)
            .resolve(&SearchConfig::default())
            .unwrap_err();
        assert!(err.is_invalid_query());
    }

    #[test]
    fn test_search_query_resolve_rejects_out_of_range_threshold() {
        let config = SearchConfig::default();
        assert!(SearchQuery::new("q").with_threshold(1.5).resolve(&config).is_err());
        assert!(SearchQuery::new("q").with_threshold(-0.1).resolve(&config).is_err());
        assert!(SearchQuery::new("q").with_threshold(f32::NAN).resolve(&config).is_err());
        assert!(SearchQuery::new("q").with_threshold(1.0).resolve(&config).is_ok());
    }

    #[test]
    fn test_search_query_serialization_skips_unset() {
        let json = serde_json::to_string(&SearchQuery::new("q")).unwrap();
        assert!(!json.contains("top_k"));
        assert!(!json.contains("strategy"));
    }

    // ------------------------------------------------------------------------
    // SearchResult tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_search_result_empty() {
        let result = SearchResult::empty(SearchStrategy::Sparse);
        assert!(result.is_empty());
        assert!(result.scores.is_empty());
        assert_eq!(result.strategy, SearchStrategy::Sparse);
    }

    #[test]
    fn test_search_result_from_ranked_keeps_items_and_scores_consistent() {
        let result = SearchResult::from_ranked(
            SearchStrategy::Dense,
            vec![
                ("a".to_string(), 0.9),
                ("b".to_string(), 0.5),
                ("a".to_string(), 0.1),
            ],
        );

        assert_eq!(result.items, vec!["a", "b"]);
        assert_eq!(result.scores.len(), result.items.len());
        assert_eq!(result.score("a"), Some(0.9));
        assert_eq!(result.score("missing"), None);
    }

    #[test]
    fn test_search_result_resolve() {
        let scope = vec![
            DocumentChunk::new("c1", 1, "first"),
            DocumentChunk::new("c2", 1, "second"),
        ];
        let result = SearchResult::from_ranked(
            SearchStrategy::Sparse,
            vec![
                ("c2".to_string(), 1.0),
                ("gone".to_string(), 0.8),
                ("c1".to_string(), 0.5),
            ],
        );

        let resolved = result.resolve(&scope);
        let ids: Vec<&str> = resolved.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }
}
