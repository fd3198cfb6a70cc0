//! Embedding backend trait and mock implementation.
//!
//! This module defines the `EmbeddingBackend` trait that abstracts over
//! embedding generation (fastembed, remote APIs, etc.). The backend is the
//! only suspension point in the engine; retry policy, if any, belongs to the
//! backend implementation.
//!
//! # Backends
//!
//! - `MockEmbeddingBackend`: Deterministic fixed-dimension vectors for testing
//! - `FastEmbedBackend`: Local embedding via fastembed (requires `vector-fastembed` feature)

use async_trait::async_trait;
use skein_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for generating dense text embeddings.
///
/// Implementations must return exactly one vector per input text, in input
/// order. The trait requires `Send + Sync` so a single backend can be shared
/// across async tasks.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for a batch of texts with the named model.
    async fn generate_embeddings(&self, texts: &[&str], model: &str) -> Result<Vec<Vec<f32>>>;

    /// The embedding dimension produced by `model`.
    async fn embedding_dimensions(&self, model: &str) -> Result<usize>;

    /// The backend name for diagnostics.
    fn name(&self) -> &str;
}

/// A mock embedding backend for testing.
///
/// Generates deterministic vectors based on the input text bytes, so the
/// same text always produces the same embedding. Individual texts can be
/// pinned to fixed vectors. Every call is counted, which lets tests assert on
/// cache behaviour.
#[derive(Debug, Default)]
pub struct MockEmbeddingBackend {
    dimension: usize,
    fixtures: HashMap<String, Vec<f32>>,
    return_empty: bool,
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MockEmbeddingBackend {
    /// Create a new mock backend with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    /// A backend that answers every request with no vectors.
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            return_empty: true,
            ..Default::default()
        }
    }

    /// Pin `text` to a fixed vector.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixtures.insert(text.into(), vector);
        self
    }

    /// Number of `generate_embeddings` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Size of each batch received, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    /// Generate a deterministic embedding from text.
    fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.fixtures.get(text) {
            return vector.clone();
        }

        let mut embedding = vec![0.0f32; self.dimension];
        let bytes = text.as_bytes();

        for (i, val) in embedding.iter_mut().enumerate() {
            let byte_val = if bytes.is_empty() {
                0u8
            } else {
                bytes[i % bytes.len()]
            };
            *val = ((byte_val as f32 + i as f32) % 256.0) / 256.0;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn generate_embeddings(&self, texts: &[&str], _model: &str) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(texts.len());
        }

        if self.return_empty {
            return Ok(Vec::new());
        }

        Ok(texts
            .iter()
            .map(|t| self.deterministic_embedding(t))
            .collect())
    }

    async fn embedding_dimensions(&self, _model: &str) -> Result<usize> {
        if self.dimension == 0 {
            return Err(Error::backend("mock backend has no dimension"));
        }
        Ok(self.dimension)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================
