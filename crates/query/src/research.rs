use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use extract::{ChatMessage, LanguageModel};
use index::{Embedder, QueryMatch, VectorStore};

pub const NOT_FOUND_ANSWER: &str =
    "I could not find relevant information in the knowledge base to answer your query.";

const RESEARCH_SYSTEM_PROMPT: &str =
    "You are a helpful legal assistant that answers questions based on provided context and cites sources.";

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ResearchResult {
    pub answer: String,
    /// Distinct sources of the retrieved chunks
    pub sources: Vec<String>,
    pub query: String,
}

/// Retrieval-augmented question answering over the chunk collection
pub struct ResearchEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    top_k: usize,
}

impl ResearchEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            top_k,
        }
    }

    pub async fn research(&self, query: &str) -> Result<ResearchResult> {
        // Step 1: Embed the query
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        // Step 2: Nearest chunks, unfiltered
        let matches = self
            .store
            .query(&query_embedding, self.top_k)
            .await
            .context("Failed to search vector store")?;

        debug!(retrieved = matches.len(), top_k = self.top_k, "Retrieved chunks");

        if matches.is_empty() {
            info!("No chunks retrieved, answering with the fallback message");
            return Ok(ResearchResult {
                answer: NOT_FOUND_ANSWER.to_string(),
                sources: Vec::new(),
                query: query.to_string(),
            });
        }

        // Step 3: Build context and generate
        let context = build_context(&matches);
        let messages = [
            ChatMessage::system(RESEARCH_SYSTEM_PROMPT),
            ChatMessage::user(build_research_prompt(&context, query)),
        ];

        let answer = self
            .llm
            .complete(&messages)
            .await
            .context("Failed to generate research answer")?;

        Ok(ResearchResult {
            answer,
            sources: collect_sources(&matches),
            query: query.to_string(),
        })
    }
}

fn build_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_research_prompt(context: &str, query: &str) -> String {
    format!(
        r#"Based on the following legal context, answer the question. Cite the source of each piece of information you use from the context. If you cannot find the answer in the context, state that clearly.

Legal Context:
{}

Question: {}

Answer:"#,
        context, query
    )
}

/// Source label per match, first occurrence wins. Matches without a source are
/// labelled by their 1-based rank.
fn collect_sources(matches: &[QueryMatch]) -> Vec<String> {
    let mut seen = HashSet::new();
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            m.metadata
                .as_ref()
                .map(|meta| meta.source.clone())
                .filter(|source| !source.is_empty())
                .unwrap_or_else(|| format!("Document {}", i + 1))
        })
        .filter(|source| seen.insert(source.clone()))
        .collect()
}
