use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ingest::{Chunk, DocumentMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub chunk_id: String,
}

impl ChunkMetadata {
    pub fn for_chunk(document: &DocumentMetadata, chunk: &Chunk) -> Self {
        Self {
            source: document.source.clone(),
            doc_type: document.doc_type.clone(),
            chunk_id: chunk.chunk_id.clone(),
        }
    }
}

/// One stored entry of the collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A nearest-neighbour hit. Lower distance is closer.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub metadata: Option<ChunkMetadata>,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddOutcome {
    pub added: usize,
    /// Ids that were already in the collection and left untouched
    pub skipped: Vec<String>,
}

/// Persistent collection of embedded chunks
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, records: Vec<ChunkRecord>) -> Result<AddOutcome>;

    /// Up to `k` records closest to `embedding`, nearest first
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>>;

    async fn count(&self) -> Result<usize>;

    fn name(&self) -> &str;
}

/// Checks a batch on its own: non-empty vectors of one dimensionality, unique ids.
/// Returns the batch dimensionality, or `None` for an empty batch.
pub(crate) fn validate_batch(records: &[ChunkRecord]) -> Result<Option<usize>> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let dimension = first.embedding.len();

    let mut seen = HashSet::new();
    for record in records {
        if record.embedding.is_empty() {
            anyhow::bail!("Record '{}' has an empty embedding", record.id);
        }
        if record.embedding.len() != dimension {
            anyhow::bail!(
                "Record '{}' has dimension {}, expected {}",
                record.id,
                record.embedding.len(),
                dimension
            );
        }
        if !seen.insert(record.id.as_str()) {
            anyhow::bail!("Duplicate id '{}' in batch", record.id);
        }
    }

    Ok(Some(dimension))
}

pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        1.0
    } else {
        1.0 - dot / (mag_a * mag_b)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn record(id: &str, source: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            text: format!("text of {}", id),
            embedding,
            metadata: ChunkMetadata {
                source: source.to_string(),
                doc_type: "educational".to_string(),
                chunk_id: id.to_string(),
            },
        }
    }
}
