use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::store::{validate_batch, AddOutcome, ChunkMetadata, ChunkRecord, QueryMatch, VectorStore};

/// Vector store backed by a Qdrant server, spoken to over its REST API
pub struct QdrantStore {
    base_url: String,
    client: reqwest::Client,
    collection_name: String,
    collection_ready: OnceCell<()>,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Serialize)]
struct UpsertPoints {
    points: Vec<Point>,
}

#[derive(Serialize)]
struct Point {
    id: u64,
    vector: Vec<f32>,
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct CollectionInfo {
    result: CollectionResult,
}

#[derive(Deserialize)]
struct CollectionResult {
    collections: Vec<Collection>,
}

#[derive(Deserialize)]
struct Collection {
    name: String,
}

impl QdrantStore {
    pub fn new(base_url: String, collection_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            collection_name,
            collection_ready: OnceCell::new(),
        }
    }

    /// Create the collection on first write; its size is taken from the first batch
    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        self.collection_ready
            .get_or_try_init(|| async {
                if self.collection_exists().await? {
                    info!(collection = %self.collection_name, "Qdrant collection already exists");
                    return Ok(());
                }

                let url = format!("{}/collections/{}", self.base_url, self.collection_name);
                let create_req = CreateCollection {
                    vectors: VectorParams {
                        size: dimension,
                        distance: "Cosine".to_string(),
                    },
                };

                let response = self
                    .client
                    .put(&url)
                    .json(&create_req)
                    .send()
                    .await
                    .context("Failed to send create-collection request to Qdrant")?;

                if !response.status().is_success() {
                    let error_text = response.text().await.unwrap_or_default();
                    anyhow::bail!("Failed to create collection: {}", error_text);
                }

                info!(
                    collection = %self.collection_name,
                    dimension,
                    "Created Qdrant collection"
                );
                Ok::<(), anyhow::Error>(())
            })
            .await
            .map(|_| ())
    }

    async fn collection_exists(&self) -> Result<bool> {
        let url = format!("{}/collections", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach Qdrant")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to list collections: {}", response.status());
        }

        let info: CollectionInfo = response
            .json()
            .await
            .context("Failed to parse Qdrant collection list")?;
        Ok(info
            .result
            .collections
            .iter()
            .any(|c| c.name == self.collection_name))
    }

    /// Point ids of `ids` that are already stored
    async fn existing_point_ids(&self, ids: &[u64]) -> Result<HashSet<u64>> {
        let url = format!(
            "{}/collections/{}/points",
            self.base_url, self.collection_name
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({ "ids": ids, "with_payload": false, "with_vector": false }))
            .send()
            .await
            .context("Failed to send retrieve request to Qdrant")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to look up existing points: {}", error_text);
        }

        let result: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Qdrant retrieve response")?;
        parse_point_ids(&result)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn add(&self, records: Vec<ChunkRecord>) -> Result<AddOutcome> {
        let Some(dimension) = validate_batch(&records)? else {
            return Ok(AddOutcome::default());
        };
        self.ensure_collection(dimension).await?;

        let ids: Vec<u64> = records.iter().map(|r| point_id(&r.id)).collect();
        let existing = self.existing_point_ids(&ids).await?;
        let (fresh, skipped) = partition_new(records, &existing);
        for id in &skipped {
            warn!(id = %id, "Id already exists in collection, skipping");
        }

        if fresh.is_empty() {
            return Ok(AddOutcome { added: 0, skipped });
        }

        let added = fresh.len();
        let points = fresh.into_iter().map(to_point).collect();

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection_name
        );
        let response = self
            .client
            .put(&url)
            .json(&UpsertPoints { points })
            .send()
            .await
            .context("Failed to send upsert request to Qdrant")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to upsert points: {}", error_text);
        }

        Ok(AddOutcome { added, skipped })
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection_name
        );
        let body = json!({
            "vector": embedding,
            "limit": k,
            "with_payload": true
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send search request to Qdrant")?;

        // Nothing has been ingested yet
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Qdrant search failed: {}", error_text);
        }

        let result: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Qdrant response")?;

        parse_search_response(&result)
    }

    async fn count(&self) -> Result<usize> {
        let url = format!(
            "{}/collections/{}/points/count",
            self.base_url, self.collection_name
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({ "exact": true }))
            .send()
            .await
            .context("Failed to send count request to Qdrant")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(0);
        }
        if !response.status().is_success() {
            anyhow::bail!("Qdrant count failed: {}", response.status());
        }

        let result: serde_json::Value = response.json().await?;
        result["result"]["count"]
            .as_u64()
            .map(|c| c as usize)
            .context("Invalid Qdrant count response")
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

fn to_point(record: ChunkRecord) -> Point {
    Point {
        id: point_id(&record.id),
        vector: record.embedding,
        payload: json!({
            "id": record.id,
            "text": record.text,
            "source": record.metadata.source,
            "type": record.metadata.doc_type,
            "chunk_id": record.metadata.chunk_id,
        }),
    }
}

/// Split a batch into records to store and ids of records already present
fn partition_new(records: Vec<ChunkRecord>, existing: &HashSet<u64>) -> (Vec<ChunkRecord>, Vec<String>) {
    let mut fresh = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for record in records {
        if existing.contains(&point_id(&record.id)) {
            skipped.push(record.id);
        } else {
            fresh.push(record);
        }
    }
    (fresh, skipped)
}

fn parse_point_ids(result: &serde_json::Value) -> Result<HashSet<u64>> {
    let points = result["result"]
        .as_array()
        .context("Invalid Qdrant retrieve response")?;
    Ok(points.iter().filter_map(|p| p["id"].as_u64()).collect())
}

/// Qdrant wants integer or UUID ids; derive a stable u64 from the string id
fn point_id(id: &str) -> u64 {
    let digest = Sha256::digest(id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn parse_search_response(result: &serde_json::Value) -> Result<Vec<QueryMatch>> {
    let points = result["result"]
        .as_array()
        .context("Invalid Qdrant response format")?;

    let mut matches = Vec::with_capacity(points.len());
    for point in points {
        let score = point["score"].as_f64().unwrap_or(0.0) as f32;
        let payload = point["payload"].as_object().context("Missing payload")?;

        let id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| point["id"].to_string());
        let text = payload
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let metadata =
            serde_json::from_value::<ChunkMetadata>(serde_json::Value::Object(payload.clone())).ok();

        matches.push(QueryMatch {
            id,
            text,
            metadata,
            distance: 1.0 - score,
        });
    }

    Ok(matches)
}
