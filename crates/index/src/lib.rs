pub mod embeddings;
pub mod local_store;
pub mod qdrant_store;
pub mod store;

pub use embeddings::{Embedder, EmbeddingClient};
pub use local_store::LocalVectorStore;
pub use qdrant_store::QdrantStore;
pub use store::{AddOutcome, ChunkMetadata, ChunkRecord, QueryMatch, VectorStore};

use std::sync::Arc;

use anyhow::{Context, Result};
use ingest::{Chunker, DocumentMetadata, SampleDocument};
use serde::Serialize;
use tracing::{info, warn};

/// Chunks documents, embeds each chunk and stores the results
pub struct Indexer {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailure {
    pub chunk_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub doc_id: String,
    pub chunks_total: usize,
    pub chunks_ingested: usize,
    /// Chunks whose id was already stored
    pub chunks_skipped: usize,
    pub failures: Vec<ChunkFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
}

impl IngestReport {
    pub fn documents_processed(&self) -> usize {
        self.documents.len()
    }

    pub fn chunks_ingested(&self) -> usize {
        self.documents.iter().map(|d| d.chunks_ingested).sum()
    }

    pub fn chunks_failed(&self) -> usize {
        self.documents.iter().map(|d| d.failures.len()).sum()
    }
}

impl Indexer {
    pub fn new(chunker: Chunker, embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            chunker,
            embedder,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Index one document. A chunk that fails to embed is recorded and skipped;
    /// a store failure aborts the document.
    pub async fn index_document(
        &self,
        doc_id: &str,
        text: &str,
        metadata: &DocumentMetadata,
    ) -> Result<DocumentReport> {
        let chunks = self.chunker.chunk_text(doc_id, text);

        let mut records = Vec::with_capacity(chunks.len());
        let mut failures = Vec::new();

        for chunk in &chunks {
            match self.embedder.embed(&chunk.text).await {
                Ok(embedding) => records.push(ChunkRecord {
                    id: chunk.chunk_id.clone(),
                    text: chunk.text.clone(),
                    embedding,
                    metadata: ChunkMetadata::for_chunk(metadata, chunk),
                }),
                Err(e) => {
                    warn!(
                        doc_id,
                        chunk = chunk.index,
                        error = %format!("{:#}", e),
                        "Failed to embed chunk, skipping"
                    );
                    failures.push(ChunkFailure {
                        chunk_id: chunk.chunk_id.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        let outcome = if records.is_empty() {
            AddOutcome::default()
        } else {
            self.store
                .add(records)
                .await
                .with_context(|| format!("Failed to store chunks of '{}'", doc_id))?
        };

        info!(
            doc_id,
            chunks = chunks.len(),
            ingested = outcome.added,
            skipped = outcome.skipped.len(),
            failed = failures.len(),
            "Indexed document"
        );

        Ok(DocumentReport {
            doc_id: doc_id.to_string(),
            chunks_total: chunks.len(),
            chunks_ingested: outcome.added,
            chunks_skipped: outcome.skipped.len(),
            failures,
        })
    }

    pub async fn index_documents(&self, documents: &[SampleDocument]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for doc in documents {
            let doc_report = self.index_document(&doc.id, &doc.text, &doc.metadata).await?;
            report.documents.push(doc_report);
        }
        Ok(report)
    }
}
