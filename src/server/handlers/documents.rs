//! Document ingestion and index inspection endpoints.
//!
//! Upload handling (file parsing, text extraction) lives with the caller;
//! these handlers receive plain text.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let source = request.source.as_deref().unwrap_or("upload");
    let chunks = state
        .rag
        .index_document(&request.title, &request.text, source)
        .await?;

    Ok(Json(json!({
        "title": request.title,
        "chunks_indexed": chunks,
    })))
}

pub async fn count(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let chunks = state.rag.chunk_count().await?;
    Ok(Json(json!({ "chunks": chunks })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    10
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let chunks = state.rag.search_text(&params.q, params.limit).await?;
    Ok(Json(json!({ "chunks": chunks })))
}
