use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::store::{cosine_distance, validate_batch, AddOutcome, ChunkRecord, QueryMatch, VectorStore};

/// Single-collection vector store persisted as one JSON file under a local directory.
///
/// Search is an exhaustive cosine-distance scan over every record.
pub struct LocalVectorStore {
    path: PathBuf,
    collection: RwLock<CollectionFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    dimension: Option<usize>,
    records: Vec<ChunkRecord>,
}

impl LocalVectorStore {
    /// Open `<dir>/<collection_name>.json`, starting empty if it does not exist yet
    pub async fn open(dir: impl AsRef<Path>, collection_name: &str) -> Result<Self> {
        let path = dir.as_ref().join(format!("{}.json", collection_name));

        let collection = match fs::read_to_string(&path).await {
            Ok(raw) => {
                let collection: CollectionFile = serde_json::from_str(&raw)
                    .with_context(|| format!("Corrupt collection file: {:?}", path))?;
                if collection.name != collection_name {
                    anyhow::bail!(
                        "Collection file {:?} holds '{}', expected '{}'",
                        path,
                        collection.name,
                        collection_name
                    );
                }
                collection
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CollectionFile {
                name: collection_name.to_string(),
                dimension: None,
                records: Vec::new(),
            },
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read collection file: {:?}", path));
            }
        };

        info!(
            collection = collection_name,
            path = %path.display(),
            records = collection.records.len(),
            "Opened local vector store"
        );

        Ok(Self {
            path,
            collection: RwLock::new(collection),
        })
    }

    async fn persist(&self, collection: &CollectionFile) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create store directory: {:?}", dir))?;
        }

        let json = serde_json::to_vec(collection).context("Failed to serialize collection")?;

        // Write-then-rename so a crash never leaves a half-written collection
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        Ok(())
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn add(&self, records: Vec<ChunkRecord>) -> Result<AddOutcome> {
        let Some(dimension) = validate_batch(&records)? else {
            return Ok(AddOutcome::default());
        };

        let mut collection = self.collection.write().await;

        if let Some(expected) = collection.dimension {
            if expected != dimension {
                anyhow::bail!(
                    "Embedding dimension {} does not match collection dimension {}",
                    dimension,
                    expected
                );
            }
        }

        let existing: HashSet<String> = collection.records.iter().map(|r| r.id.clone()).collect();
        let previous_len = collection.records.len();
        let previous_dimension = collection.dimension;

        let mut outcome = AddOutcome::default();
        for record in records {
            if existing.contains(&record.id) {
                warn!(id = %record.id, "Id already exists in collection, skipping");
                outcome.skipped.push(record.id);
                continue;
            }
            collection.records.push(record);
            outcome.added += 1;
        }

        if outcome.added == 0 {
            return Ok(outcome);
        }

        collection.dimension = Some(dimension);
        if let Err(e) = self.persist(&collection).await {
            collection.records.truncate(previous_len);
            collection.dimension = previous_dimension;
            return Err(e);
        }

        debug!(added = outcome.added, total = collection.records.len(), "Persisted collection");
        Ok(outcome)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>> {
        let collection = self.collection.read().await;

        if collection.records.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if let Some(expected) = collection.dimension {
            if embedding.len() != expected {
                anyhow::bail!(
                    "Query embedding has dimension {}, collection has {}",
                    embedding.len(),
                    expected
                );
            }
        }

        let mut scored: Vec<(f32, &ChunkRecord)> = collection
            .records
            .iter()
            .map(|r| (cosine_distance(embedding, &r.embedding), r))
            .collect();

        // Stable sort keeps insertion order between equal distances
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, r)| QueryMatch {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: Some(r.metadata.clone()),
                distance,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.collection.read().await.records.len())
    }

    fn name(&self) -> &str {
        "local"
    }
}
