//! Vector-bearing entities.
//!
//! Any domain object that can be embedded and searched carries a
//! [`VectorFields`] block. Entities are created without vectors; a writer
//! fills the block once per `(entity, model)` and only an explicit rewrite
//! replaces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SparseVector;

/// Vectors produced for one entity by one model.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedVectors {
    /// Dense embedding.
    pub dense: Vec<f32>,
    /// Sparse term weights.
    pub sparse: SparseVector,
    /// Model that produced `dense`.
    pub model: String,
    /// Length of `dense`.
    pub dimensions: usize,
}

/// Optional vector fields stored on an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorFields {
    /// Dense embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dense: Option<Vec<f32>>,

    /// Sparse term weights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<SparseVector>,

    /// Model that produced the vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    /// Length of the dense vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,

    /// When the vectors were written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl VectorFields {
    /// Whether a dense vector from `model` is already stored.
    pub fn has_vectors_for(&self, model: &str) -> bool {
        self.dense.is_some() && self.embedding_model.as_deref() == Some(model)
    }

    /// Replace all fields with freshly generated vectors.
    pub fn assign(&mut self, vectors: EmbeddedVectors) {
        self.dense = Some(vectors.dense);
        self.sparse = Some(vectors.sparse);
        self.embedding_model = Some(vectors.model);
        self.dimensions = Some(vectors.dimensions);
        self.generated_at = Some(Utc::now());
    }

    /// Remove all vectors.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// An entity that carries vectors and can be ranked by the search engine.
pub trait VectorEntity: Send + Sync {
    /// Stable identifier, unique within a candidate scope.
    fn entity_id(&self) -> &str;

    /// Stored vectors.
    fn vectors(&self) -> &VectorFields;

    /// Mutable access for writers.
    fn vectors_mut(&mut self) -> &mut VectorFields;
}

// ============================================================================
// Entity kinds
// ============================================================================

/// A chunk of an ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk identifier.
    pub id: String,

    /// Owning document.
    pub document_id: u64,

    /// Position of the chunk within its document.
    #[serde(default)]
    pub position: usize,

    /// Cleaned chunk text.
    pub content: String,

    /// Stored vectors.
    #[serde(flatten)]
    pub vectors: VectorFields,
}

impl DocumentChunk {
    /// Create a chunk without vectors.
    pub fn new(id: impl Into<String>, document_id: u64, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document_id,
            position: 0,
            content: content.into(),
            vectors: VectorFields::default(),
        }
    }

    /// Set the chunk position.
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Message identifier.
    pub id: String,

    /// Owning conversation.
    pub conversation_id: u64,

    /// Author role (`user`, `assistant`, `system`, `tool`).
    pub role: String,

    /// Message body.
    pub content: String,

    /// Stored vectors.
    #[serde(flatten)]
    pub vectors: VectorFields,
}

impl ConversationMessage {
    /// Create a message without vectors.
    pub fn new(
        id: impl Into<String>,
        conversation_id: u64,
        role: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id,
            role: role.into(),
            content: content.into(),
            vectors: VectorFields::default(),
        }
    }
}

/// A chunk of a page fetched from the web.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageChunk {
    /// Chunk identifier.
    pub id: String,

    /// Source URL.
    pub url: String,

    /// Page title, if the fetcher found one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Extracted chunk text.
    pub content: String,

    /// Stored vectors.
    #[serde(flatten)]
    pub vectors: VectorFields,
}

impl PageChunk {
    /// Create a page chunk without vectors.
    pub fn new(id: impl Into<String>, url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: None,
            content: content.into(),
            vectors: VectorFields::default(),
        }
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

macro_rules! impl_vector_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl VectorEntity for $ty {
                fn entity_id(&self) -> &str {
                    &self.id
                }

                fn vectors(&self) -> &VectorFields {
                    &self.vectors
                }

                fn vectors_mut(&mut self) -> &mut VectorFields {
                    &mut self.vectors
                }
            }
        )+
    };
}

impl_vector_entity!(DocumentChunk, ConversationMessage, PageChunk);

// ============================================================================
// Tests
// ============================================================================
