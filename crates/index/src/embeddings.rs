use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Maps text to a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Client for an OpenAI-compatible `/embeddings` endpoint
#[derive(Clone)]
pub struct EmbeddingClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Same endpoint and credentials, different model
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    fn build_request(&self, text: &str) -> EmbeddingRequest<'_> {
        EmbeddingRequest {
            model: &self.model,
            input: vec![normalize_text(text)],
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let mut request = self.client.post(&url).json(&self.build_request(text));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Failed to send embedding request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding request failed ({}): {}", status, body);
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        let embedding = embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .context("Embedding response contained no data")?;

        if embedding.is_empty() {
            anyhow::bail!("Embedding provider returned an empty vector");
        }

        Ok(embedding)
    }
}

/// Newlines are flattened to spaces before embedding
pub fn normalize_text(text: &str) -> String {
    text.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newlines_become_spaces() {
        assert_eq!(normalize_text("Term.\nSurvival.\n"), "Term. Survival. ");
    }

    #[test]
    fn test_request_body_shape() {
        let client = EmbeddingClient::new(
            "http://localhost:1234/v1/".to_string(),
            None,
            DEFAULT_EMBEDDING_MODEL.to_string(),
        );
        let body = serde_json::to_value(client.build_request("a\nb")).unwrap();

        assert_eq!(
            body,
            serde_json::json!({"model": "text-embedding-ada-002", "input": ["a b"]})
        );
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_with_model_overrides_request_model() {
        let client = EmbeddingClient::new(
            DEFAULT_BASE_URL.to_string(),
            Some("sk-test".to_string()),
            DEFAULT_EMBEDDING_MODEL.to_string(),
        );
        let small = client.with_model("text-embedding-3-small");

        let body = serde_json::to_value(small.build_request("clause")).unwrap();
        assert_eq!(body["model"], "text-embedding-3-small");
        assert_eq!(small.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            serde_json::to_value(client.build_request("clause")).unwrap()["model"],
            "text-embedding-ada-002"
        );
    }
}
