//! Quiz question schema and structured-output validation.
//!
//! Generative models are not guaranteed to return well-formed JSON. This
//! module extracts a JSON payload from raw model output and validates every
//! question against the schema invariants; a violation rejects the whole
//! response so the orchestrator can take its deterministic fallback.

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

impl QuizQuestion {
    /// Check the schema invariants: exactly four options and a
    /// `correct_index` that points at a real option.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.question.trim().is_empty() {
            return Err(ApiError::Generation(
                "quiz question text is empty".to_string(),
            ));
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(ApiError::Generation(format!(
                "quiz question has {} options, expected {}",
                self.options.len(),
                OPTIONS_PER_QUESTION
            )));
        }
        if self.correct_index >= self.options.len() {
            return Err(ApiError::Generation(format!(
                "correct_index {} is out of range",
                self.correct_index
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct QuizPayload {
    #[serde(default)]
    questions: Vec<QuizQuestion>,
}

/// Parse raw model output into at most `limit` validated questions.
///
/// Accepts either a `{ "questions": [...] }` object or a bare array, with
/// any surrounding prose or code fences stripped. Any parse failure, schema
/// violation, or empty question list is an error; the caller falls back.
pub fn parse_quiz_response(raw: &str, limit: usize) -> Result<Vec<QuizQuestion>, ApiError> {
    let payload = extract_json(raw)
        .ok_or_else(|| ApiError::Generation("no JSON payload in model output".to_string()))?;

    let mut questions = if let Ok(parsed) = serde_json::from_str::<QuizPayload>(payload) {
        parsed.questions
    } else {
        serde_json::from_str::<Vec<QuizQuestion>>(payload)
            .map_err(|e| ApiError::Generation(format!("malformed quiz JSON: {}", e)))?
    };

    questions.truncate(limit);
    if questions.is_empty() {
        return Err(ApiError::Generation(
            "model returned no quiz questions".to_string(),
        ));
    }

    for question in &questions {
        question.validate()?;
    }

    Ok(questions)
}

/// Slice out the outermost JSON value, tolerating fences and prose.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find(['{', '['])?;
    let end = raw.rfind(['}', ']'])?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
