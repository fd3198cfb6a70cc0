//! Hybrid semantic retrieval for Skein.
//!
//! This crate turns text into dense and sparse vectors, caches embeddings by
//! content, and ranks candidate entities by dense, sparse or fused (hybrid)
//! similarity. Embedding generation and nearest-neighbor storage are
//! pluggable collaborators.
//!
//! # Features
//!
//! - `vector-fastembed`: Enable local embedding generation via fastembed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     skein-vector                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingBackend trait                                     │
//! │  ├── MockEmbeddingBackend (always available)                │
//! │  └── FastEmbedBackend (feature: vector-fastembed)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingCache trait                                       │
//! │  └── MemoryEmbeddingCache (+ JSON snapshot persistence)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingService (cache + batching + SparseEncoder)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorWriter trait (per-kind text + persistence)           │
//! │  VectorWriteDriver (shared batch orchestration)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorSearchEngine (dense / sparse / hybrid RRF)           │
//! │  NativeVectorIndex trait (optional dense fast path)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use skein_vector::{
//!     ChunkVectorWriter, DocumentChunk, EmbeddingConfig, EmbeddingService,
//!     MemoryEmbeddingCache, MockEmbeddingBackend, SearchConfig, SearchQuery,
//!     VectorSearchEngine, VectorWriteDriver,
//! };
//! use std::sync::Arc;
//!
//! let service = Arc::new(EmbeddingService::new(
//!     Arc::new(MockEmbeddingBackend::new(384)),
//!     Arc::new(MemoryEmbeddingCache::new()),
//!     EmbeddingConfig::default(),
//! ));
//!
//! let mut chunks = vec![DocumentChunk::new("c1", 42, "cats purr when content")];
//! VectorWriteDriver::new(service.clone(), ChunkVectorWriter)
//!     .write(&mut chunks, None)
//!     .await?;
//!
//! let engine = VectorSearchEngine::new(service, SearchConfig::default());
//! let result = engine.search(&SearchQuery::new("purring cats"), &chunks).await?;
//! for id in &result.items {
//!     println!("{id}: {:.4}", result.scores[id]);
//! }
//! ```

// Core modules (always available)
pub mod embedding;
pub mod entity;
pub mod types;

// Vector math
pub mod similarity;
pub mod sparse;

// Caching and persistence
pub mod cache;
pub mod persistence;

// Orchestration
pub mod hybrid;
pub mod index;
pub mod search;
pub mod service;
pub mod writer;

// Feature-gated backend modules
#[cfg(feature = "vector-fastembed")]
pub mod fastembed;

// Re-exports: core types
pub use types::{
    EmbeddingConfig, EmbeddingRecord, ResolvedQuery, SearchConfig, SearchQuery, SearchResult,
    SearchStrategy, SparseVector,
};

// Re-exports: entities
pub use entity::{
    ConversationMessage, DocumentChunk, EmbeddedVectors, PageChunk, VectorEntity, VectorFields,
};

// Re-exports: traits and implementations
pub use cache::{EmbeddingCache, MemoryEmbeddingCache};
pub use embedding::{EmbeddingBackend, MockEmbeddingBackend};
pub use index::{MemoryVectorIndex, NativeVectorIndex, ScopeFilter};
pub use writer::{
    ChunkVectorWriter, MessageVectorWriter, PageChunkVectorWriter, VectorWriteDriver,
    VectorWriter, WriteStats,
};

// Re-exports: engine
pub use search::VectorSearchEngine;
pub use service::EmbeddingService;
pub use sparse::SparseEncoder;

// Re-exports: math
pub use hybrid::{FusedResult, FusionSource, RRF_K, reciprocal_rank_fusion};
pub use similarity::{cosine_similarity, validate_dimensions};

// Feature-gated re-exports
#[cfg(feature = "vector-fastembed")]
pub use fastembed::FastEmbedBackend;
