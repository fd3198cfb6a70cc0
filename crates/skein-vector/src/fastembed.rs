//! FastEmbed embedding backend.
//!
//! Wraps the `fastembed` crate to provide local embedding generation
//! via pre-trained models (e.g., BGE-small, AllMiniLM).
//!
//! # Thread Safety
//!
//! `fastembed::TextEmbedding` is not `Send + Sync`, so loaded models live in
//! an `Arc<Mutex<>>` map and embedding calls run on
//! `tokio::task::spawn_blocking`.
//!
//! # Feature Gate
//!
//! This module requires the `vector-fastembed` feature.

use crate::embedding::EmbeddingBackend;
use async_trait::async_trait;
use skein_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Map a model name string to a fastembed `EmbeddingModel` and its dimension.
fn resolve_model(name: &str) -> Result<(fastembed::EmbeddingModel, usize)> {
    match name {
        "bge-small-en-v1.5" | "BGESmallENV15" => Ok((fastembed::EmbeddingModel::BGESmallENV15, 384)),
        "all-minilm-l6-v2" | "AllMiniLML6V2" => Ok((fastembed::EmbeddingModel::AllMiniLML6V2, 384)),
        "bge-base-en-v1.5" | "BGEBaseENV15" => Ok((fastembed::EmbeddingModel::BGEBaseENV15, 768)),
        "bge-large-en-v1.5" | "BGELargeENV15" => Ok((fastembed::EmbeddingModel::BGELargeENV15, 1024)),
        other => Err(Error::config(format!(
            "Unknown embedding model: '{other}'. Supported: bge-small-en-v1.5, all-minilm-l6-v2, bge-base-en-v1.5, bge-large-en-v1.5"
        ))),
    }
}

/// FastEmbed-based embedding backend.
///
/// Models are downloaded and initialised on first use, then reused for all
/// subsequent calls naming the same model.
///
/// # Supported Models
///
/// | Name | Dimension | Size |
/// |------|-----------|------|
/// | `bge-small-en-v1.5` | 384 | ~50MB |
/// | `all-minilm-l6-v2` | 384 | ~80MB |
/// | `bge-base-en-v1.5` | 768 | ~130MB |
/// | `bge-large-en-v1.5` | 1024 | ~335MB |
pub struct FastEmbedBackend {
    models: Arc<Mutex<HashMap<String, fastembed::TextEmbedding>>>,
    cache_path: Option<String>,
}

impl FastEmbedBackend {
    /// Create a backend that stores downloaded model files in `cache_path`.
    pub fn new(cache_path: Option<&str>) -> Self {
        Self {
            models: Arc::new(Mutex::new(HashMap::new())),
            cache_path: cache_path.map(String::from),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for FastEmbedBackend {
    async fn generate_embeddings(&self, texts: &[&str], model: &str) -> Result<Vec<Vec<f32>>> {
        let (model_enum, _) = resolve_model(model)?;
        let models = self.models.clone();
        let cache_path = self.cache_path.clone();
        let model_name = model.to_string();
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

        tokio::task::spawn_blocking(move || {
            let mut models = models
                .lock()
                .map_err(|e| Error::operation(format!("Mutex poisoned: {e}")))?;

            if !models.contains_key(&model_name) {
                let mut init = fastembed::InitOptions::new(model_enum);
                if let Some(path) = cache_path {
                    init = init.with_cache_dir(std::path::PathBuf::from(path));
                }
                let loaded = fastembed::TextEmbedding::try_new(init).map_err(|e| {
                    Error::backend(format!("Failed to initialize fastembed model: {e}"))
                })?;
                log::info!("loaded fastembed model {model_name}");
                models.insert(model_name.clone(), loaded);
            }

            let embedder = models
                .get_mut(&model_name)
                .ok_or_else(|| Error::backend(format!("model {model_name} not loaded")))?;
            embedder
                .embed(texts, None)
                .map_err(|e| Error::backend(format!("Batch embedding failed: {e}")))
        })
        .await
        .map_err(|e| Error::operation(format!("spawn_blocking failed: {e}")))?
    }

    async fn embedding_dimensions(&self, model: &str) -> Result<usize> {
        resolve_model(model).map(|(_, dimension)| dimension)
    }

    fn name(&self) -> &str {
        "fastembed"
    }
}

impl std::fmt::Debug for FastEmbedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedBackend")
            .field("cache_path", &self.cache_path)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
