//! RAG service — the generation orchestrator.
//!
//! Drives the full pipeline: ingestion (chunk, embed, index) and the three
//! query paths (explain, quiz, chat). Every query path short-circuits when
//! retrieval finds nothing, grounds the prompt in assembled context only,
//! and degrades deterministically when the generation capability fails or
//! returns malformed structured output. The outcome of each request is an
//! explicit state, not exception control flow.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::chunker;
use super::context;
use super::embedder::Embedder;
use super::quiz::{self, QuizQuestion};
use super::retriever::{RetrievedChunk, Retriever};
use super::store::{StoredChunk, VectorStore};
use crate::config::AppConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, GenerationProvider};

const EXPLAIN_SYSTEM_PROMPT: &str = "\
You are StudyMate, a helpful study assistant.

You will be given:
1) A QUESTION from the student.
2) CONTEXT from their own uploaded study documents.

Rules:
- Use ONLY the information in the CONTEXT to answer.
- If the answer is not clearly in the context, say so and invite the student to upload more notes.
- Explain in simple, student-friendly language.
- Stay concise but clear.";

const QUIZ_SYSTEM_PROMPT: &str = "\
You are StudyMate, a study assistant.

You will be given:
1) A TOPIC the student wants to be quizzed on.
2) CONTEXT from their uploaded study documents.

Create clear, useful multiple-choice questions.

Rules:
- Use ONLY the CONTEXT to create questions and answers.
- Each question must have exactly 4 options.
- Make only ONE option clearly correct.
- Options must be non-overlapping and plausible.
- Explanations must briefly reference the context.
- Return ONLY valid JSON with this exact schema:

{
  \"questions\": [
    {
      \"question\": \"string\",
      \"options\": [\"string\", \"string\", \"string\", \"string\"],
      \"correct_index\": 0,
      \"explanation\": \"string\"
    }
  ]
}";

const NO_CONTEXT_ANSWER: &str = "I couldn't find any relevant information in your \
uploaded documents for this question. Try uploading more notes or a different file.";

const CHAT_NO_QUESTION_REPLY: &str = "I didn't receive a question.";

const CHAT_NO_CONTEXT_REPLY: &str = "I couldn't find anything relevant in your \
uploaded documents yet. Upload some notes and ask me again.";

const CHAT_UNAVAILABLE_REPLY: &str = "Sorry, I couldn't come up with a reply just \
now. Please try again in a moment.";

/// Tunables the service needs from the application config.
#[derive(Debug, Clone)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
    pub max_context_chars: usize,
}

impl From<&AppConfig> for RagSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            chunk_size: config.chunking.chunk_size,
            overlap: config.chunking.overlap,
            top_k: config.retrieval.top_k,
            max_context_chars: config.retrieval.max_context_chars,
        }
    }
}

/// Terminal state of one orchestrated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// The generation capability produced the result.
    Generated,
    /// The deterministic non-generative path produced the result.
    Fallback,
    /// Retrieval found no material; no generation call was made.
    NoContext,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub question: String,
    pub answer: String,
    pub chunks: Vec<RetrievedChunk>,
    pub outcome: GenerationOutcome,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    pub outcome: GenerationOutcome,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub chunks: Vec<RetrievedChunk>,
    pub outcome: GenerationOutcome,
}

pub struct RagService {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    generator: Arc<dyn GenerationProvider>,
    settings: RagSettings,
}

impl RagService {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn GenerationProvider>,
        settings: RagSettings,
    ) -> Self {
        let retriever = Retriever::new(embedder.clone(), store.clone());
        Self {
            store,
            embedder,
            retriever,
            generator,
            settings,
        }
    }

    /// Split, embed, and index one document. Returns the chunk count.
    ///
    /// Re-ingesting the same text creates new chunks; nothing is deduplicated.
    /// Embedding happens before the store is touched, so no index lock spans
    /// an external call.
    pub async fn index_document(
        &self,
        title: &str,
        raw_text: &str,
        source: &str,
    ) -> Result<usize, ApiError> {
        let pieces = chunker::split(raw_text, self.settings.chunk_size, self.settings.overlap)?;
        if pieces.is_empty() {
            return Ok(0);
        }

        let document_id = Uuid::new_v4().to_string();
        let mut batch = Vec::with_capacity(pieces.len());
        for (sequence_index, text) in pieces.into_iter().enumerate() {
            let embedding = self.embedder.embed(&text).await?;
            batch.push((
                StoredChunk {
                    chunk_id: Uuid::new_v4().to_string(),
                    text,
                    document_id: document_id.clone(),
                    title: title.to_string(),
                    source: source.to_string(),
                    sequence_index,
                },
                embedding,
            ));
        }

        let count = self.store.insert_batch(batch).await?;
        tracing::info!(document_id = %document_id, chunks = count, "indexed document");
        Ok(count)
    }

    /// Answer a question grounded in retrieved notes.
    pub async fn explain(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<ExplainResponse, ApiError> {
        let k = top_k.unwrap_or(self.settings.top_k);
        let chunks = self.retriever.retrieve(question, k).await?;

        if chunks.is_empty() {
            return Ok(ExplainResponse {
                question: question.to_string(),
                answer: NO_CONTEXT_ANSWER.to_string(),
                chunks,
                outcome: GenerationOutcome::NoContext,
            });
        }

        let context = context::assemble(&chunks, self.settings.max_context_chars);
        let user_prompt = format!(
            "QUESTION:\n{}\n\nCONTEXT (from your notes):\n{}",
            question, context
        );

        match self
            .generator
            .generate(EXPLAIN_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(answer) => Ok(ExplainResponse {
                question: question.to_string(),
                answer: answer.trim().to_string(),
                chunks,
                outcome: GenerationOutcome::Generated,
            }),
            Err(err) => {
                tracing::warn!("explain generation failed, using fallback: {}", err);
                let answer = fallback_explanation(&chunks);
                Ok(ExplainResponse {
                    question: question.to_string(),
                    answer,
                    chunks,
                    outcome: GenerationOutcome::Fallback,
                })
            }
        }
    }

    /// Build a multiple-choice quiz about a topic from retrieved notes.
    pub async fn quiz(&self, topic: &str, num_questions: usize) -> Result<QuizResponse, ApiError> {
        if num_questions == 0 {
            return Err(ApiError::Config(
                "must request at least one question".to_string(),
            ));
        }

        // Wider retrieval than the question count so the model has material
        // to draw distractors from.
        let breadth = num_questions.saturating_mul(2).max(6);
        let chunks = self.retriever.retrieve(topic, breadth).await?;

        if chunks.is_empty() {
            return Ok(QuizResponse {
                topic: topic.to_string(),
                questions: Vec::new(),
                outcome: GenerationOutcome::NoContext,
            });
        }

        let context = context::assemble(&chunks, self.settings.max_context_chars);
        let user_prompt = format!(
            "TOPIC:\n{}\n\nCONTEXT (from the student's notes):\n{}\n\nNumber of questions to generate: {}",
            topic, context, num_questions
        );

        let generated = match self
            .generator
            .generate(QUIZ_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(raw) => quiz::parse_quiz_response(&raw, num_questions),
            Err(err) => Err(err),
        };

        match generated {
            Ok(questions) => Ok(QuizResponse {
                topic: topic.to_string(),
                questions,
                outcome: GenerationOutcome::Generated,
            }),
            Err(err) => {
                tracing::warn!("quiz generation failed, using fallback: {}", err);
                let questions = fallback_quiz(topic, &chunks, num_questions);
                Ok(QuizResponse {
                    topic: topic.to_string(),
                    questions,
                    outcome: GenerationOutcome::Fallback,
                })
            }
        }
    }

    /// Reply to a conversation, grounded in retrieved notes.
    ///
    /// The latest user message drives retrieval. Chat has no derived
    /// fallback; a generation failure yields a canned reply and is only
    /// logged.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        top_k: Option<usize>,
    ) -> Result<ChatResponse, ApiError> {
        let Some(question) = messages
            .iter()
            .rev()
            .find(|m| m.role == "user" && !m.content.trim().is_empty())
            .map(|m| m.content.trim().to_string())
        else {
            return Ok(ChatResponse {
                reply: CHAT_NO_QUESTION_REPLY.to_string(),
                chunks: Vec::new(),
                outcome: GenerationOutcome::NoContext,
            });
        };

        let k = top_k.unwrap_or(self.settings.top_k);
        let chunks = self.retriever.retrieve(&question, k).await?;

        if chunks.is_empty() {
            return Ok(ChatResponse {
                reply: CHAT_NO_CONTEXT_REPLY.to_string(),
                chunks,
                outcome: GenerationOutcome::NoContext,
            });
        }

        let context = context::assemble(&chunks, self.settings.max_context_chars);
        let system_prompt = format!(
            "You are StudyMate, a friendly study assistant. Use ONLY the provided \
             context from the student's documents when answering. If the context is \
             not enough, say you don't have enough information instead of guessing.\n\n\
             Context:\n{}",
            context
        );

        let mut transcript = String::from("Conversation so far:\n");
        for message in messages {
            match message.role.as_str() {
                "user" => {
                    transcript.push_str("Student: ");
                    transcript.push_str(&message.content);
                    transcript.push('\n');
                }
                "assistant" => {
                    transcript.push_str("Assistant: ");
                    transcript.push_str(&message.content);
                    transcript.push('\n');
                }
                _ => {}
            }
        }
        transcript.push_str("\nAssistant:");

        match self.generator.generate(&system_prompt, &transcript).await {
            Ok(reply) => Ok(ChatResponse {
                reply: reply.trim().to_string(),
                chunks,
                outcome: GenerationOutcome::Generated,
            }),
            Err(err) => {
                tracing::warn!("chat generation failed: {}", err);
                Ok(ChatResponse {
                    reply: CHAT_UNAVAILABLE_REPLY.to_string(),
                    chunks,
                    outcome: GenerationOutcome::Fallback,
                })
            }
        }
    }

    /// Total chunks currently indexed.
    pub async fn chunk_count(&self) -> Result<usize, ApiError> {
        self.store.count().await
    }

    /// Substring search over stored chunk text, for inspecting the index.
    pub async fn search_text(
        &self,
        pattern: &str,
        limit: usize,
    ) -> Result<Vec<StoredChunk>, ApiError> {
        self.store.text_search(pattern, limit).await
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .take(max_chars)
        .collect();
    if text.chars().count() > max_chars {
        format!("{}...", cleaned.trim_end())
    } else {
        cleaned
    }
}

/// Non-generative explanation built from the top retrieved chunk.
fn fallback_explanation(chunks: &[RetrievedChunk]) -> String {
    let top = &chunks[0];
    format!(
        "I couldn't generate an explanation right now, so here is the most \
         relevant passage from your notes instead:\n\n\"{}\"\n\n(from {})",
        snippet(&top.chunk.text, 300),
        top.chunk.title
    )
}

/// Non-generative quiz: each question excerpts a retrieved chunk as the
/// correct option against three fixed distractors. Every question produced
/// here satisfies the schema invariants by construction.
fn fallback_quiz(topic: &str, chunks: &[RetrievedChunk], num_questions: usize) -> Vec<QuizQuestion> {
    chunks
        .iter()
        .take(num_questions)
        .map(|retrieved| QuizQuestion {
            question: format!(
                "According to your notes, which of these is an important idea about {}?",
                topic
            ),
            options: vec![
                snippet(&retrieved.chunk.text, 140),
                "An unrelated statement.".to_string(),
                "A generic definition not taken from your notes.".to_string(),
                "None of the above.".to_string(),
            ],
            correct_index: 0,
            explanation: "The first option is taken directly from your uploaded material."
                .to_string(),
        })
        .collect()
}
