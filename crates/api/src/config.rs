use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ingest::ChunkerConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub vector_store: VectorStoreConfig,
    pub chunking: ChunkingConfig,
    pub research: ResearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path every endpoint is mounted under
    pub route_prefix: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Local,
    Qdrant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    /// Directory of the local store
    pub path: PathBuf,
    pub collection: String,
    pub qdrant_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            route_prefix: "/api/legalmind".to_string(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: extract::llm::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            chat_model: extract::llm::DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: index::embeddings::DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Local,
            path: PathBuf::from("./legal_vector_db"),
            collection: "legal_document_chunks".to_string(),
            qdrant_url: "http://localhost:6333".to_string(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        let chunker = ChunkerConfig::default();
        Self {
            chunk_size: chunker.chunk_size,
            chunk_overlap: chunker.chunk_overlap,
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            top_k: query::research::DEFAULT_TOP_K,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
        }
    }
}

impl FromStr for VectorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(VectorBackend::Local),
            "qdrant" => Ok(VectorBackend::Qdrant),
            other => anyhow::bail!("Unknown vector store backend '{}' (expected local or qdrant)", other),
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown log format '{}' (expected text or json)", other),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ChunkingConfig {
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            ..ChunkerConfig::default()
        }
    }
}

impl AppConfig {
    /// Defaults, then the JSON file named by `LEGALMIND_CONFIG`, then environment
    /// variables (a `.env` file is honoured)
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var("LEGALMIND_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid config file: {}", path))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LEGALMIND_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("LEGALMIND_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid LEGALMIND_PORT: {}", port))?;
        }
        if let Some(prefix) = lookup("LEGALMIND_ROUTE_PREFIX") {
            self.server.route_prefix = prefix;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(model) = lookup("LEGALMIND_CHAT_MODEL") {
            self.provider.chat_model = model;
        }
        if let Some(model) = lookup("LEGALMIND_EMBEDDING_MODEL") {
            self.provider.embedding_model = model;
        }
        if let Some(backend) = lookup("LEGALMIND_VECTOR_BACKEND") {
            self.vector_store.backend = backend.parse()?;
        }
        if let Some(path) = lookup("LEGALMIND_VECTOR_DB_PATH") {
            self.vector_store.path = PathBuf::from(path);
        }
        if let Some(collection) = lookup("LEGALMIND_COLLECTION") {
            self.vector_store.collection = collection;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.qdrant_url = url;
        }
        if let Some(top_k) = lookup("LEGALMIND_TOP_K") {
            self.research.top_k = top_k
                .parse()
                .with_context(|| format!("Invalid LEGALMIND_TOP_K: {}", top_k))?;
        }
        if let Some(format) = lookup("LEGALMIND_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let prefix = &self.server.route_prefix;
        if !prefix.is_empty() && !prefix.starts_with('/') {
            anyhow::bail!("route_prefix must start with '/': {}", prefix);
        }
        if self.research.top_k == 0 {
            anyhow::bail!("research.top_k must be greater than zero");
        }
        if self.vector_store.collection.is_empty() {
            anyhow::bail!("vector_store.collection must not be empty");
        }
        self.chunking
            .chunker_config()
            .validate()
            .context("Invalid chunking configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.server.route_prefix, "/api/legalmind");
        assert_eq!(config.provider.chat_model, "gpt-4");
        assert_eq!(config.provider.embedding_model, "text-embedding-ada-002");
        assert_eq!(config.vector_store.backend, VectorBackend::Local);
        assert_eq!(config.vector_store.collection, "legal_document_chunks");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.research.top_k, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("LEGALMIND_PORT", "8080"),
                ("OPENAI_API_KEY", "sk-test"),
                ("LEGALMIND_VECTOR_BACKEND", "Qdrant"),
                ("LEGALMIND_TOP_K", "3"),
                ("LEGALMIND_LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.vector_store.backend, VectorBackend::Qdrant);
        assert_eq!(config.research.top_k, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_overrides_are_errors() {
        let mut config = AppConfig::default();
        assert!(config.apply_overrides(env(&[("LEGALMIND_PORT", "http")])).is_err());
        assert!(config.apply_overrides(env(&[("LEGALMIND_VECTOR_BACKEND", "chroma")])).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.server.route_prefix = "api".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.chunking.chunk_overlap = 2000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.research.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server": {"port": 9000}, "vector_store": {"backend": "qdrant"}}"#).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.vector_store.backend, VectorBackend::Qdrant);
        assert_eq!(config.vector_store.collection, "legal_document_chunks");
    }

    #[test]
    fn test_api_key_is_never_printed() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-secret".to_string());

        assert!(!format!("{:?}", config).contains("sk-secret"));
        assert!(!serde_json::to_string(&config).unwrap().contains("sk-secret"));
    }
}
