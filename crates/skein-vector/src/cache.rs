//! Content-addressed embedding cache.
//!
//! Maps `(text, model)` to a dense vector so unchanged text is never sent
//! to the backend twice. Keys are [`skein_core::content_hash`] digests.
//!
//! `put` is an upsert: writing a different vector for an existing key
//! replaces the stored record. Two callers racing on the same uncached text
//! at worst both call the backend and both write; the last write wins.

use async_trait::async_trait;
use skein_core::{Result, content_hash};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

use crate::persistence;
use crate::types::EmbeddingRecord;

/// Trait for embedding cache stores.
///
/// The backing store must support atomic key-based upsert.
#[async_trait]
pub trait EmbeddingCache: Send + Sync {
    /// Look up the vector for `text` embedded by `model`.
    async fn get(&self, text: &str, model: &str) -> Result<Option<Vec<f32>>>;

    /// Store (or replace) the vector for `text` embedded by `model`.
    async fn put(&self, text: &str, model: &str, dense: &[f32]) -> Result<()>;

    /// The cache name for diagnostics.
    fn name(&self) -> &str;
}

/// In-memory embedding cache.
///
/// Records can be snapshotted to and restored from a JSON file.
#[derive(Debug, Default)]
pub struct MemoryEmbeddingCache {
    records: RwLock<HashMap<String, EmbeddingRecord>>,
}

impl MemoryEmbeddingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-populated with `records`.
    ///
    /// Later records replace earlier ones with the same key.
    pub fn from_records(records: impl IntoIterator<Item = EmbeddingRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.content_hash.clone(), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// Restore a cache from a snapshot file.
    ///
    /// A missing file yields an empty cache.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let records = persistence::load_records(path)?;
        log::debug!("loaded {} cached embeddings from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    /// Write all records to a snapshot file.
    pub async fn save_snapshot(&self, path: &Path) -> Result<()> {
        let records = self.records().await;
        persistence::save_records(path, &records)?;
        log::debug!("saved {} cached embeddings to {}", records.len(), path.display());
        Ok(())
    }

    /// Full record for `text` embedded by `model`.
    pub async fn get_record(&self, text: &str, model: &str) -> Option<EmbeddingRecord> {
        self.records.read().await.get(&content_hash(text, model)).cloned()
    }

    /// All records, sorted by content hash.
    pub async fn records(&self) -> Vec<EmbeddingRecord> {
        let mut records: Vec<EmbeddingRecord> =
            self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.content_hash.cmp(&b.content_hash));
        records
    }

    /// Number of cached records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Remove every record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl EmbeddingCache for MemoryEmbeddingCache {
    async fn get(&self, text: &str, model: &str) -> Result<Option<Vec<f32>>> {
        let key = content_hash(text, model);
        Ok(self.records.read().await.get(&key).map(|r| r.dense.clone()))
    }

    async fn put(&self, text: &str, model: &str, dense: &[f32]) -> Result<()> {
        let record = EmbeddingRecord::new(text, model, dense.to_vec());
        self.records
            .write()
            .await
            .insert(record.content_hash.clone(), record);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Tests
// ============================================================================
