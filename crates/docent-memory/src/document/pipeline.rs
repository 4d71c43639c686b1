use std::collections::HashMap;
use std::sync::Arc;

use docent_llm::LlmProvider;
use serde_json::{Value, json};
use uuid::Uuid;

use super::types::{Chunk, ChunkSpan, Document, DocumentRef, DocumentSource, SearchResult};
use super::{DocumentError, TextSplitter};
use crate::embedder::Embedder;
use crate::vector_store::{ScoredVectorPoint, VectorPoint, VectorStore};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub collection: String,
    pub vector_size: u64,
    /// Minimum cosine similarity for a search hit.
    pub score_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collection: "documents".into(),
            vector_size: 1536,
            score_threshold: 0.6,
        }
    }
}

/// Chunk, embed and index documents; embed queries and search the index.
pub struct RetrievalPipeline<P> {
    splitter: TextSplitter,
    embedder: Embedder<P>,
    store: Arc<dyn VectorStore>,
    config: PipelineConfig,
}

impl<P: LlmProvider> RetrievalPipeline<P> {
    #[must_use]
    pub fn new(
        splitter: TextSplitter,
        embedder: Embedder<P>,
        store: Arc<dyn VectorStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            splitter,
            embedder,
            store,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Create the collection if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector store is unreachable or rejects the collection.
    pub async fn ensure_collection(&self) -> Result<(), DocumentError> {
        self.store
            .ensure_collection(&self.config.collection, self.config.vector_size)
            .await?;
        Ok(())
    }

    /// Split, embed and upsert a document. Returns the number of chunks written.
    ///
    /// All chunks are embedded before anything is written, so an embedding
    /// failure leaves the index untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any embedding call or the batch upsert fails.
    pub async fn index_document(&self, document: &Document) -> Result<usize, DocumentError> {
        tracing::info!(document_id = %document.id, name = %document.name, "indexing document");

        let chunks = self.splitter.split_document(document);
        if chunks.is_empty() {
            tracing::info!(document_id = %document.id, "document produced no chunks");
            return Ok(0);
        }
        tracing::debug!(chunks = chunks.len(), "split document");

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let points: Vec<VectorPoint> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| VectorPoint {
                id: chunk.id.to_string(),
                vector,
                payload: chunk_payload(&chunk, document),
            })
            .collect();

        let count = points.len();
        self.store.upsert(&self.config.collection, points).await?;

        tracing::info!(document_id = %document.id, chunks = count, "indexed document");
        Ok(count)
    }

    /// Embed `query` and return up to `limit` hits scoring at least the
    /// configured threshold, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or searching the index fails.
    pub async fn search_similar(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, DocumentError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        let threshold = self.config.score_threshold;
        let hits = self
            .store
            .search(
                &self.config.collection,
                vector,
                u64::try_from(limit).unwrap_or(u64::MAX),
                Some(threshold),
            )
            .await?;
        let returned = hits.len();

        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .filter(|hit| hit.score >= threshold)
            .filter_map(hit_to_result)
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);

        tracing::debug!(returned, kept = results.len(), threshold, "search complete");
        Ok(results)
    }
}

fn chunk_payload(chunk: &Chunk, document: &Document) -> HashMap<String, Value> {
    HashMap::from([
        ("document_id".into(), json!(document.id.to_string())),
        ("document_name".into(), json!(document.name)),
        ("content".into(), json!(chunk.content)),
        ("chunk_index".into(), json!(chunk.chunk_index)),
        ("source".into(), json!(document.source.as_str())),
        ("source_id".into(), json!(document.source_id)),
        ("start_char".into(), json!(chunk.span.start)),
        ("end_char".into(), json!(chunk.span.end)),
    ])
}

fn payload_usize(payload: &HashMap<String, Value>, key: &str) -> usize {
    payload
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(0)
}

fn payload_str<'a>(payload: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

fn hit_to_result(hit: ScoredVectorPoint) -> Option<SearchResult> {
    let Ok(chunk_id) = Uuid::parse_str(&hit.id) else {
        tracing::warn!(point_id = %hit.id, "skipping hit whose id is not a chunk uuid");
        return None;
    };
    let payload = &hit.payload;
    let Some(document_id) = payload_str(payload, "document_id").and_then(|s| Uuid::parse_str(s).ok())
    else {
        tracing::warn!(point_id = %hit.id, "skipping hit without a valid document_id");
        return None;
    };
    let Some(content) = payload_str(payload, "content") else {
        tracing::warn!(point_id = %hit.id, "skipping hit without content");
        return None;
    };

    let source = payload_str(payload, "source")
        .and_then(|s| s.parse::<DocumentSource>().ok())
        .unwrap_or_default();

    Some(SearchResult {
        chunk: Chunk {
            id: chunk_id,
            document_id,
            content: content.to_owned(),
            embedding: Vec::new(),
            chunk_index: payload_usize(payload, "chunk_index"),
            span: ChunkSpan {
                start: payload_usize(payload, "start_char"),
                end: payload_usize(payload, "end_char"),
            },
        },
        document: DocumentRef {
            id: document_id,
            name: payload_str(payload, "document_name")
                .unwrap_or_default()
                .to_owned(),
            source,
            source_id: payload_str(payload, "source_id").map(str::to_owned),
        },
        score: hit.score,
    })
}
