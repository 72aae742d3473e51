use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use draft::{Draft, DocumentTemplate};
use extract::{Analysis, Summary, SummaryType};
use ingest::sample_documents;
use query::ResearchResult;

use crate::error::{required, ApiError, ApiResult};
use crate::metrics::{track_requests, MetricsSnapshot, TimedOperation};
use crate::state::SharedState;

#[derive(Deserialize)]
struct DocumentRequest {
    text: Option<String>,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    text: Option<String>,
    #[serde(rename = "type")]
    summary_type: Option<String>,
}

#[derive(Deserialize)]
struct ResearchRequest {
    query: Option<String>,
}

#[derive(Deserialize)]
struct DraftRequest {
    #[serde(rename = "type")]
    document_type: Option<String>,
    parameters: Option<Map<String, Value>>,
}

#[derive(Serialize)]
struct IngestResponse {
    message: String,
    documents_processed: usize,
    chunks_ingested: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// All endpoints mounted under `prefix`, with request metrics, tracing and
/// permissive CORS applied to every route
pub fn router(state: SharedState, prefix: &str) -> Router {
    let api = Router::new()
        .route("/analyze-document", post(analyze_document))
        .route("/summarize-document", post(summarize_document))
        .route("/legal-research", post(legal_research))
        .route("/draft-document", post(draft_document))
        .route("/ingest-sample-data", post(ingest_sample_data))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .with_state(state.clone());

    let prefix = prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(prefix, api)
    };

    app.layer(middleware::from_fn_with_state(
        state.metrics.clone(),
        track_requests,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn analyze_document(
    State(state): State<SharedState>,
    payload: Result<Json<DocumentRequest>, JsonRejection>,
) -> ApiResult<Analysis> {
    let Json(req) = payload?;
    let text = required(req.text, "No document text provided")?;

    let analysis = state.extractor.extract(&text).await?;
    info!(
        chars = text.len(),
        parsed = analysis.is_extracted(),
        "Analyzed document"
    );
    Ok(Json(analysis))
}

async fn summarize_document(
    State(state): State<SharedState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<Summary> {
    let Json(req) = payload?;
    let text = required(req.text, "No document text provided")?;

    let summary_type = match req.summary_type {
        Some(raw) => raw
            .parse::<SummaryType>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => SummaryType::default(),
    };

    let summary = state.summarizer.summarize(&text, summary_type).await?;
    info!(%summary_type, "Summarized document");
    Ok(Json(summary))
}

async fn legal_research(
    State(state): State<SharedState>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> ApiResult<ResearchResult> {
    let Json(req) = payload?;
    let query = required(req.query, "No query provided")?;

    let timer = TimedOperation::start();
    let result = state.research.research(&query).await?;
    state.metrics.record_research(timer.elapsed());

    info!(
        sources = result.sources.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Answered research query"
    );
    Ok(Json(result))
}

async fn draft_document(
    State(state): State<SharedState>,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> ApiResult<Draft> {
    let Json(req) = payload?;
    let document_type = required(req.document_type, "No document type provided")?;

    let template = DocumentTemplate::from_type(&document_type).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Document type \"{}\" not supported yet",
            document_type
        ))
    })?;

    let parameters = req.parameters.unwrap_or_default();
    let draft = state
        .drafter
        .draft(template, &document_type, parameters)
        .await?;
    info!(document_type = %draft.document_type, "Drafted document");
    Ok(Json(draft))
}

async fn ingest_sample_data(State(state): State<SharedState>) -> ApiResult<IngestResponse> {
    let documents = sample_documents();
    let report = state.indexer.index_documents(&documents).await?;

    let chunks_ingested = report.chunks_ingested();
    let documents_processed = report.documents_processed();
    state
        .metrics
        .record_ingest(chunks_ingested, report.chunks_failed());

    match state.indexer.store().count().await {
        Ok(stored) => info!(
            documents_processed,
            chunks_ingested,
            chunks_failed = report.chunks_failed(),
            stored,
            "Ingested sample documents"
        ),
        Err(e) => warn!(
            error = %format!("{:#}", e),
            chunks_ingested,
            "Ingested sample documents; collection size unavailable"
        ),
    }

    Ok(Json(IngestResponse {
        message: format!(
            "Successfully ingested {} chunks from {} documents",
            chunks_ingested, documents_processed
        ),
        documents_processed,
        chunks_ingested,
    }))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "LegalMind AI",
    })
}

async fn get_metrics(State(state): State<SharedState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
