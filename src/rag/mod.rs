//! Retrieval-augmented generation pipeline.
//!
//! Write path: document → `chunker` → `embedder` → vector store.
//! Read path: query → `embedder` → store search → `retriever` ranking →
//! `context` assembly → `service` orchestration (explain / quiz / chat).

pub mod chunker;
pub mod context;
pub mod embedder;
pub mod memory;
pub mod quiz;
pub mod retriever;
pub mod service;
pub mod sqlite;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use embedder::{Embedder, HttpEmbedder};
pub use memory::MemoryStore;
pub use quiz::QuizQuestion;
pub use retriever::{RetrievedChunk, Retriever};
pub use service::{
    ChatResponse, ExplainResponse, GenerationOutcome, QuizResponse, RagService, RagSettings,
};
pub use sqlite::SqliteVectorStore;
pub use store::{ChunkHit, StoredChunk, VectorStore};
