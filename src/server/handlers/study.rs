//! Query endpoints: explain, quiz, chat.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::llm::ChatMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub question: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

pub async fn explain(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExplainRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.rag.explain(&request.question, request.top_k).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub topic: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
}

fn default_num_questions() -> usize {
    5
}

pub async fn quiz(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.rag.quiz(&request.topic, request.num_questions).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.rag.chat(&request.messages, request.top_k).await?;
    Ok(Json(result))
}
