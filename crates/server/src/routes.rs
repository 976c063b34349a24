//! Route handlers.

use crate::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use methodics_knowledge::ingest::{ingest_document, ingest_qa_pair};
use methodics_knowledge::text::truncate_with_ellipsis;
use methodics_core::{AppError, AppResult};
use methodics_knowledge::{
    ChatRequest, ChatResponse, ChatService, Document, NewDocument, NewQaPair, QaPair,
    SourceSnippet,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NOT_FOUND_MESSAGE: &str = "Методичка не найдена";

pub type SharedService = Arc<ChatService>;

/// Runs synchronous storage work on the blocking pool.
pub(crate) async fn blocking<T, F>(service: &SharedService, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&ChatService) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || work(&service))
        .await
        .map_err(|e| AppError::Other(format!("Storage task failed: {}", e)))?
        .map_err(ApiError::from)
}

// ============ POST /chat ============

pub async fn chat(
    State(service): State<SharedService>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = service.answer(&request).await?;
    Ok(Json(response))
}

// ============ GET /search ============

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    10
}

pub async fn search(
    State(service): State<SharedService>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SourceSnippet>>, ApiError> {
    let snippets = blocking(&service, move |service| {
        let preview_chars = service.config().snippet_chars;
        Ok(service
            .search_documents(&params.query, params.limit)?
            .iter()
            .map(|doc| {
                SourceSnippet::from_document(doc, truncate_with_ellipsis(&doc.body, preview_chars))
            })
            .collect::<Vec<_>>())
    })
    .await?;
    Ok(Json(snippets))
}

// ============ GET /qa/search ============

#[derive(Debug, Deserialize)]
pub struct QaSearchParams {
    pub query: String,
    #[serde(default = "default_qa_threshold")]
    pub threshold: f64,
    #[serde(default = "default_qa_limit")]
    pub limit: usize,
}

fn default_qa_threshold() -> f64 {
    0.5
}

fn default_qa_limit() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct QaSearchResult {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub score: f64,
    pub methodic_title: Option<String>,
    pub methodic_author: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QaSearchResponse {
    pub results: Vec<QaSearchResult>,
    pub count: usize,
}

pub async fn search_qa(
    State(service): State<SharedService>,
    Query(params): Query<QaSearchParams>,
) -> Result<Json<QaSearchResponse>, ApiError> {
    if !(0.0..=1.0).contains(&params.threshold) {
        return Err(ApiError::bad_request("threshold must be in [0, 1]"));
    }

    let hits = blocking(&service, move |service| {
        service.search_qa(&params.query, params.threshold, params.limit)
    })
    .await?;

    let results: Vec<QaSearchResult> = hits
        .into_iter()
        .map(|ctx| QaSearchResult {
            id: ctx.hit.pair.id,
            question: ctx.hit.pair.question,
            answer: ctx.hit.pair.answer,
            score: ctx.hit.score,
            methodic_title: ctx.document.as_ref().map(|d| d.display_title().to_string()),
            methodic_author: ctx.document.and_then(|d| d.author),
        })
        .collect();

    Ok(Json(QaSearchResponse {
        count: results.len(),
        results,
    }))
}

// ============ /methodics ============

pub async fn get_methodic(
    State(service): State<SharedService>,
    Path(id): Path<i64>,
) -> Result<Json<SourceSnippet>, ApiError> {
    let document = blocking(&service, move |service| service.store().get_document(id))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND_MESSAGE))?;
    Ok(Json(SourceSnippet::from_document(&document, document.body.clone())))
}

pub async fn create_methodic(
    State(service): State<SharedService>,
    Json(input): Json<NewDocument>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let document = blocking(&service, move |service| ingest_document(service.store(), input)).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn delete_methodic(
    State(service): State<SharedService>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if blocking(&service, move |service| service.store().delete_document(id)).await? {
        tracing::info!("Deleted methodic {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(NOT_FOUND_MESSAGE))
    }
}

// ============ POST /qa ============

pub async fn create_qa(
    State(service): State<SharedService>,
    Json(input): Json<NewQaPair>,
) -> Result<(StatusCode, Json<QaPair>), ApiError> {
    let pair = blocking(&service, move |service| ingest_qa_pair(service.store(), input)).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

// ============ GET / and /health ============

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Methodics Chat Bot API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "POST /chat - Чат с поиском по Q&A и методичкам",
            "GET /search - Поиск по методичкам",
            "GET /qa/search - Поиск по Q&A",
            "GET /methodics/{id} - Получить методичку по ID",
            "POST /methodics - Добавить методичку",
            "DELETE /methodics/{id} - Удалить методичку",
            "POST /qa - Добавить пару вопрос-ответ",
            "GET /health - Проверка состояния",
        ],
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_available: bool,
}

pub async fn health(State(service): State<SharedService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        llm_available: service.summarizer().is_available(),
    })
}
