use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use draft::Drafter;
use extract::{ChatClient, Extractor, LanguageModel, Summarizer};
use index::{Embedder, EmbeddingClient, Indexer, LocalVectorStore, QdrantStore, VectorStore};
use ingest::Chunker;
use query::ResearchEngine;

use crate::config::{AppConfig, VectorBackend};
use crate::metrics::Metrics;

pub type SharedState = Arc<AppState>;

/// Everything a request handler needs, built once at startup
pub struct AppState {
    pub extractor: Extractor,
    pub summarizer: Summarizer,
    pub research: ResearchEngine,
    pub drafter: Drafter,
    pub indexer: Indexer,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chunker: Chunker,
        top_k: usize,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            extractor: Extractor::new(llm.clone()),
            summarizer: Summarizer::new(llm.clone()),
            research: ResearchEngine::new(embedder.clone(), store.clone(), llm.clone(), top_k),
            drafter: Drafter::new(llm),
            indexer: Indexer::new(chunker, embedder, store),
            metrics,
        }
    }

    pub async fn from_config(config: &AppConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let provider = &config.provider;
        if provider.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; provider calls will be unauthenticated");
        }

        let llm: Arc<dyn LanguageModel> = Arc::new(ChatClient::new(
            provider.base_url.clone(),
            provider.api_key.clone(),
            provider.chat_model.clone(),
        ));
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::new(
            provider.base_url.clone(),
            provider.api_key.clone(),
            provider.embedding_model.clone(),
        ));

        let vs = &config.vector_store;
        let store: Arc<dyn VectorStore> = match vs.backend {
            VectorBackend::Local => Arc::new(
                LocalVectorStore::open(&vs.path, &vs.collection)
                    .await
                    .context("Failed to open local vector store")?,
            ),
            VectorBackend::Qdrant => Arc::new(QdrantStore::new(
                vs.qdrant_url.clone(),
                vs.collection.clone(),
            )),
        };

        let chunker = Chunker::new(config.chunking.chunker_config())?;

        info!(
            chat_model = %provider.chat_model,
            embedding_model = %provider.embedding_model,
            store = store.name(),
            collection = %vs.collection,
            top_k = config.research.top_k,
            "Pipeline ready"
        );

        Ok(Self::new(
            llm,
            embedder,
            store,
            chunker,
            config.research.top_k,
            metrics,
        ))
    }
}
