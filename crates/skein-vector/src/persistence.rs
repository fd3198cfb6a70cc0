//! Snapshot persistence for the embedding cache.
//!
//! Cached embeddings can outlive a process by being written to a JSON
//! snapshot and read back on startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skein_core::{Error, Result};
use std::path::Path;

use crate::types::EmbeddingRecord;

/// On-disk layout of a cache snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,

    /// Number of records in the snapshot.
    pub record_count: usize,

    /// Cached embeddings.
    pub records: Vec<EmbeddingRecord>,
}

/// Save embedding records to a JSON snapshot file.
pub fn save_records(path: &Path, records: &[EmbeddingRecord]) -> Result<()> {
    let snapshot = CacheSnapshot {
        saved_at: Utc::now(),
        record_count: records.len(),
        records: records.to_vec(),
    };
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json).map_err(|e| Error::io_with_path(e, path))?;
    Ok(())
}

/// Load embedding records from a JSON snapshot file.
pub fn load_records(path: &Path) -> Result<Vec<EmbeddingRecord>> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let snapshot: CacheSnapshot = serde_json::from_str(&json)?;
    if snapshot.record_count != snapshot.records.len() {
        return Err(Error::invalid_data(format!(
            "snapshot {} declares {} records but holds {}",
            path.display(),
            snapshot.record_count,
            snapshot.records.len()
        )));
    }
    Ok(snapshot.records)
}

// ============================================================================
// Tests
// ============================================================================
