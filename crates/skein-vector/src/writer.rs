//! Vector writers.
//!
//! A [`VectorWriter`] is the narrow per-kind capability: it decides what text
//! of an entity gets embedded and how the resulting vectors are stored back.
//! All batching and orchestration lives once in [`VectorWriteDriver`].
//!
//! # Lifecycle
//!
//! For a slice of entities, the driver:
//!
//! 1. Skips entities that already carry vectors for the model (unless forced)
//! 2. Calls `extract_text()` on every remaining entity
//! 3. Embeds all texts with one `embed_batch` call
//! 4. Computes a sparse vector per text
//! 5. Calls `persist()` for each entity with the vectors at its index

use async_trait::async_trait;
use skein_core::Result;
use std::sync::Arc;

use crate::entity::{ConversationMessage, DocumentChunk, EmbeddedVectors, PageChunk, VectorEntity};
use crate::service::EmbeddingService;

/// Per-kind text extraction and vector persistence.
#[async_trait]
pub trait VectorWriter: Send + Sync {
    /// The entity kind this writer handles.
    type Entity: VectorEntity;

    /// Compose the text to embed for `entity`.
    ///
    /// The returned text is also the cache key input, so it must be
    /// deterministic for unchanged content.
    fn extract_text(&self, entity: &Self::Entity) -> Result<String>;

    /// Store freshly generated vectors on `entity`.
    ///
    /// The default assigns them to the entity's [`VectorFields`](crate::VectorFields).
    async fn persist(&self, entity: &mut Self::Entity, vectors: EmbeddedVectors) -> Result<()> {
        entity.vectors_mut().assign(vectors);
        Ok(())
    }

    /// Returns the name of this writer for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Outcome of a write pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Entities that received new vectors.
    pub embedded: usize,
    /// Entities left untouched because they already had vectors.
    pub skipped: usize,
}

/// Shared batching driver over any [`VectorWriter`].
pub struct VectorWriteDriver<W: VectorWriter> {
    service: Arc<EmbeddingService>,
    writer: W,
}

impl<W: VectorWriter> VectorWriteDriver<W> {
    /// Create a driver for `writer`.
    pub fn new(service: Arc<EmbeddingService>, writer: W) -> Self {
        Self { service, writer }
    }

    /// The wrapped writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Embed entities that do not yet carry vectors for `model`.
    pub async fn write(&self, entities: &mut [W::Entity], model: Option<&str>) -> Result<WriteStats> {
        self.write_entities(entities, model, false).await
    }

    /// Re-embed every entity, replacing existing vectors.
    pub async fn rewrite(
        &self,
        entities: &mut [W::Entity],
        model: Option<&str>,
    ) -> Result<WriteStats> {
        self.write_entities(entities, model, true).await
    }

    async fn write_entities(
        &self,
        entities: &mut [W::Entity],
        model: Option<&str>,
        force: bool,
    ) -> Result<WriteStats> {
        if entities.is_empty() {
            return Ok(WriteStats::default());
        }

        let model = self.service.resolve_model(model).to_string();
        let pending: Vec<usize> = entities
            .iter()
            .enumerate()
            .filter(|(_, e)| force || !e.vectors().has_vectors_for(&model))
            .map(|(i, _)| i)
            .collect();

        let skipped = entities.len() - pending.len();
        if pending.is_empty() {
            log::debug!(
                "{}: all {} entities already embedded with {model}",
                self.writer.name(),
                entities.len()
            );
            return Ok(WriteStats {
                embedded: 0,
                skipped,
            });
        }

        let texts = pending
            .iter()
            .map(|&i| self.writer.extract_text(&entities[i]))
            .collect::<Result<Vec<String>>>()?;

        let dense = self.service.embed_batch(&texts, Some(&model)).await?;

        for ((&index, text), dense) in pending.iter().zip(&texts).zip(dense) {
            let vectors = EmbeddedVectors {
                sparse: self.service.generate_sparse_embedding(text),
                dimensions: dense.len(),
                dense,
                model: model.clone(),
            };
            self.writer.persist(&mut entities[index], vectors).await?;
        }

        log::info!(
            "{}: embedded {} entities with {model} ({skipped} skipped)",
            self.writer.name(),
            pending.len()
        );

        Ok(WriteStats {
            embedded: pending.len(),
            skipped,
        })
    }
}

impl<W: VectorWriter + std::fmt::Debug> std::fmt::Debug for VectorWriteDriver<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorWriteDriver")
            .field("writer", &self.writer)
            .finish()
    }
}

// ============================================================================
// Concrete writers
// ============================================================================

/// Writer for [`DocumentChunk`]s; embeds the chunk content.
#[derive(Clone, Debug, Default)]
pub struct ChunkVectorWriter;

#[async_trait]
impl VectorWriter for ChunkVectorWriter {
    type Entity = DocumentChunk;

    fn extract_text(&self, entity: &DocumentChunk) -> Result<String> {
        Ok(entity.content.clone())
    }

    fn name(&self) -> &str {
        "chunks"
    }
}

/// Writer for [`ConversationMessage`]s; embeds the message body.
#[derive(Clone, Debug, Default)]
pub struct MessageVectorWriter;

#[async_trait]
impl VectorWriter for MessageVectorWriter {
    type Entity = ConversationMessage;

    fn extract_text(&self, entity: &ConversationMessage) -> Result<String> {
        Ok(entity.content.clone())
    }

    fn name(&self) -> &str {
        "messages"
    }
}

/// Writer for [`PageChunk`]s.
///
/// Embeds `"{title}\n\n{content}"` when the page has a title so that the
/// title influences similarity; otherwise just the content.
#[derive(Clone, Debug, Default)]
pub struct PageChunkVectorWriter;

#[async_trait]
impl VectorWriter for PageChunkVectorWriter {
    type Entity = PageChunk;

    fn extract_text(&self, entity: &PageChunk) -> Result<String> {
        Ok(match entity.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => format!("{title}\n\n{}", entity.content),
            _ => entity.content.clone(),
        })
    }

    fn name(&self) -> &str {
        "pages"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::MemoryEmbeddingCache;
    use crate::embedding::{EmbeddingBackend, MockEmbeddingBackend};
    use crate::types::EmbeddingConfig;
    use skein_core::Error;

    fn setup() -> (Arc<EmbeddingService>, Arc<MockEmbeddingBackend>) {
        let backend = Arc::new(MockEmbeddingBackend::new(8));
        let service = Arc::new(EmbeddingService::new(
            backend.clone(),
            Arc::new(MemoryEmbeddingCache::new()),
            EmbeddingConfig::default(),
        ));
        (service, backend)
    }

    /// Writer that refuses to extract anything.
    struct FailingWriter;

    #[async_trait]
    impl VectorWriter for FailingWriter {
        type Entity = DocumentChunk;

        fn extract_text(&self, entity: &DocumentChunk) -> Result<String> {
            Err(Error::invalid_data(format!("cannot read {}", entity.id)))
        }
    }

    // ------------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------------

    #[test]
    fn test_chunk_writer_extracts_content() {
        let chunk = DocumentChunk::new("c1", 42, "the content");
        assert_eq!(ChunkVectorWriter.extract_text(&chunk).unwrap(), "the content");
    }

    #[test]
    fn test_message_writer_extracts_content() {
        let msg = ConversationMessage::new("m1", 7, "user", "hello there");
        assert_eq!(MessageVectorWriter.extract_text(&msg).unwrap(), "hello there");
    }

    #[test]
    fn test_page_writer_prefixes_title() {
        let page = PageChunk::new("p1", "https://example.com", "body text").with_title("Title");
        assert_eq!(
            PageChunkVectorWriter.extract_text(&page).unwrap(),
            "Title\n\nbody text"
        );
    }

    #[test]
    fn test_page_writer_without_title() {
        let page = PageChunk::new("p1", "https://example.com", "body text");
        assert_eq!(PageChunkVectorWriter.extract_text(&page).unwrap(), "body text");

        let blank = page.with_title("  ");
        assert_eq!(PageChunkVectorWriter.extract_text(&blank).unwrap(), "body text");
    }

    // ------------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_write_empty_is_noop() {
        let (service, backend) = setup();
        let driver = VectorWriteDriver::new(service, ChunkVectorWriter);

        let stats = driver.write(&mut [], None).await.unwrap();
        assert_eq!(stats, WriteStats::default());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_write_populates_vectors_by_index() {
        let (service, backend) = setup();
        let driver = VectorWriteDriver::new(service, ChunkVectorWriter);
        let mut chunks = vec![
            DocumentChunk::new("c1", 1, "cats purr loudly"),
            DocumentChunk::new("c2", 1, "dogs bark loudly"),
        ];

        let stats = driver.write(&mut chunks, None).await.unwrap();
        assert_eq!(stats.embedded, 2);
        assert_eq!(backend.call_count(), 1);

        let reference = MockEmbeddingBackend::new(8);
        for chunk in &chunks {
            let expected = reference
                .generate_embeddings(&[chunk.content.as_str()], "m")
                .await
                .unwrap();
            let fields = &chunk.vectors;
            assert_eq!(fields.dense.as_ref(), Some(&expected[0]));
            assert_eq!(fields.dimensions, Some(8));
            assert_eq!(fields.embedding_model.as_deref(), Some("bge-small-en-v1.5"));
            assert!(fields.generated_at.is_some());
        }

        let sparse = chunks[0].vectors.sparse.as_ref().unwrap();
        assert_eq!(sparse.get("cats"), Some(&1.0));
        assert!(!sparse.contains_key("dogs"));
    }

    #[tokio::test]
    async fn test_write_skips_already_embedded() {
        let (service, backend) = setup();
        let driver = VectorWriteDriver::new(service, MessageVectorWriter);
        let mut messages = vec![ConversationMessage::new("m1", 1, "user", "first message")];

        driver.write(&mut messages, None).await.unwrap();
        messages.push(ConversationMessage::new("m2", 1, "assistant", "second message"));

        let stats = driver.write(&mut messages, None).await.unwrap();
        assert_eq!(stats, WriteStats { embedded: 1, skipped: 1 });
        assert_eq!(backend.batch_sizes(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_write_other_model_is_not_skipped() {
        let (service, _) = setup();
        let driver = VectorWriteDriver::new(service, ChunkVectorWriter);
        let mut chunks = vec![DocumentChunk::new("c1", 1, "content")];

        driver.write(&mut chunks, Some("model-a")).await.unwrap();
        let stats = driver.write(&mut chunks, Some("model-b")).await.unwrap();

        assert_eq!(stats.embedded, 1);
        assert_eq!(chunks[0].vectors.embedding_model.as_deref(), Some("model-b"));
    }

    #[tokio::test]
    async fn test_rewrite_replaces_vectors() {
        let (service, _) = setup();
        let driver = VectorWriteDriver::new(service, PageChunkVectorWriter);
        let mut pages = vec![PageChunk::new("p1", "https://example.com", "page body")];

        driver.write(&mut pages, None).await.unwrap();
        let first_stamp = pages[0].vectors.generated_at;

        let stats = driver.rewrite(&mut pages, None).await.unwrap();
        assert_eq!(stats, WriteStats { embedded: 1, skipped: 0 });
        assert!(pages[0].vectors.generated_at >= first_stamp);
    }

    #[tokio::test]
    async fn test_extraction_error_aborts_before_embedding() {
        let (service, backend) = setup();
        let driver = VectorWriteDriver::new(service, FailingWriter);
        let mut chunks = vec![DocumentChunk::new("c1", 1, "content")];

        assert!(driver.write(&mut chunks, None).await.is_err());
        assert_eq!(backend.call_count(), 0);
        assert!(chunks[0].vectors.dense.is_none());
    }

    #[tokio::test]
    async fn test_backend_error_leaves_entities_untouched() {
        let service = Arc::new(EmbeddingService::new(
            Arc::new(MockEmbeddingBackend::empty(8)),
            Arc::new(MemoryEmbeddingCache::new()),
            EmbeddingConfig::default(),
        ));
        let driver = VectorWriteDriver::new(service, ChunkVectorWriter);
        let mut chunks = vec![DocumentChunk::new("c1", 1, "content")];

        let err = driver.write(&mut chunks, None).await.unwrap_err();
        assert!(err.is_backend());
        assert!(chunks[0].vectors.dense.is_none());
    }

    #[test]
    fn test_writer_names() {
        assert_eq!(ChunkVectorWriter.name(), "chunks");
        assert_eq!(MessageVectorWriter.name(), "messages");
        assert_eq!(PageChunkVectorWriter.name(), "pages");
        assert_eq!(FailingWriter.name(), "unnamed");
    }
}
