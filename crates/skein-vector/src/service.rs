//! Embedding service.
//!
//! The single entry point for "give me vectors for this text". Combines the
//! embedding cache, batched backend calls and sparse encoding.
//!
//! Cache failures never fail a call: a lookup error is treated as a miss and
//! a write error is logged and dropped. Backend errors always propagate.

use skein_core::{Error, Result};
use std::sync::Arc;

use crate::cache::EmbeddingCache;
use crate::embedding::EmbeddingBackend;
use crate::sparse::SparseEncoder;
use crate::types::{EmbeddingConfig, SparseVector};

/// Orchestrates cache lookups, backend calls and sparse encoding.
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
    cache: Arc<dyn EmbeddingCache>,
    encoder: SparseEncoder,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a service over `backend` and `cache`.
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        cache: Arc<dyn EmbeddingCache>,
        config: EmbeddingConfig,
    ) -> Self {
        Self {
            backend,
            cache,
            encoder: SparseEncoder::default(),
            config,
        }
    }

    /// Replace the sparse encoder.
    pub fn with_encoder(mut self, encoder: SparseEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// The named model, or the configured default.
    pub fn resolve_model<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        model.unwrap_or(&self.config.default_model)
    }

    /// Embed a single text.
    ///
    /// Returns the cached vector when caching is enabled and one exists;
    /// otherwise calls the backend with a one-element batch and caches the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmbeddingBackend`] when the backend returns nothing.
    pub async fn embed(&self, text: &str, model: Option<&str>) -> Result<Vec<f32>> {
        let model = self.resolve_model(model);

        if let Some(hit) = self.cached(text, model).await {
            return Ok(hit);
        }

        let vectors = self.backend.generate_embeddings(&[text], model).await?;
        let dense = vectors
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::backend(format!(
                    "{} returned no embedding for model {model}",
                    self.backend.name()
                ))
            })?;

        self.store(text, model, &dense).await;
        Ok(dense)
    }

    /// Embed many texts.
    ///
    /// Cache hits are served directly; misses go to the backend in batches
    /// of at most `batch_size`. The `i`-th output is always the embedding of
    /// the `i`-th input, whatever the mix of hits and misses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmbeddingBackend`] when a batch comes back with the
    /// wrong number of vectors or an empty vector.
    pub async fn embed_batch<S>(&self, texts: &[S], model: Option<&str>) -> Result<Vec<Vec<f32>>>
    where
        S: AsRef<str> + Sync,
    {
        let model = self.resolve_model(model);
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut misses: Vec<usize> = Vec::new();

        for (index, text) in texts.iter().enumerate() {
            match self.cached(text.as_ref(), model).await {
                Some(hit) => slots[index] = Some(hit),
                None => misses.push(index),
            }
        }

        let batch_size = self.config.batch_size.max(1);
        log::debug!(
            "embedding batch of {} texts with {model}: {} cached, {} to generate",
            texts.len(),
            texts.len() - misses.len(),
            misses.len()
        );

        for indices in misses.chunks(batch_size) {
            let batch: Vec<&str> = indices.iter().map(|&i| texts[i].as_ref()).collect();
            let vectors = self.backend.generate_embeddings(&batch, model).await?;

            if vectors.len() != batch.len() {
                return Err(Error::backend(format!(
                    "{} returned {} embeddings for {} texts",
                    self.backend.name(),
                    vectors.len(),
                    batch.len()
                )));
            }

            for (&index, dense) in indices.iter().zip(vectors) {
                if dense.is_empty() {
                    return Err(Error::backend(format!(
                        "{} returned an empty embedding",
                        self.backend.name()
                    )));
                }
                self.store(texts[index].as_ref(), model, &dense).await;
                slots[index] = Some(dense);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::operation(format!("no embedding for input {index}")))
            })
            .collect()
    }

    /// Sparse term weights for `text`. Not cached.
    pub fn generate_sparse_embedding(&self, text: &str) -> SparseVector {
        self.encoder.encode(text)
    }

    /// The embedding dimension for `model` (or the default model).
    pub async fn embedding_dimensions(&self, model: Option<&str>) -> Result<usize> {
        self.backend
            .embedding_dimensions(self.resolve_model(model))
            .await
    }

    async fn cached(&self, text: &str, model: &str) -> Option<Vec<f32>> {
        if !self.config.cache_enabled {
            return None;
        }
        match self.cache.get(text, model).await {
            Ok(hit) => hit,
            Err(e) => {
                log::warn!("{} cache lookup failed, falling back to backend: {e}", self.cache.name());
                None
            }
        }
    }

    async fn store(&self, text: &str, model: &str, dense: &[f32]) {
        if !self.config.cache_enabled {
            return;
        }
        if let Err(e) = self.cache.put(text, model, dense).await {
            log::warn!("{} cache write failed: {e}", self.cache.name());
        }
    }
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("backend", &self.backend.name())
            .field("cache", &self.cache.name())
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
