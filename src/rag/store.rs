//! VectorStore trait — abstract interface for the semantic index.
//!
//! Two implementations exist: `SqliteVectorStore` (durable, in the `sqlite`
//! module) and `MemoryStore` (`memory` module, used by tests and embedded
//! callers). Both rank by cosine similarity and break score ties by
//! insertion order, earliest first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A chunk as held by the index. Immutable once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Document this chunk was split from.
    pub document_id: String,
    /// Title of the source document, used for provenance tags.
    pub title: String,
    /// Caller-supplied source label (filename, upload name, ...).
    pub source: String,
    /// Position of the chunk within its document, 0-based, gap-free.
    pub sequence_index: usize,
}

/// Result of a similarity search. Higher score = more similar.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkHit {
    pub chunk: StoredChunk,
    pub score: f32,
}

/// Abstract interface over vector index backends.
///
/// Implementations must insert batches atomically: a concurrent search never
/// observes part of a batch. Nothing is deduplicated; inserting the same
/// content twice stores it twice.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embedding vectors. Returns the number stored.
    async fn insert_batch(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<usize, ApiError>;

    /// Return up to `k` chunks ordered by descending similarity to
    /// `query_embedding`. An empty index yields an empty vec, not an error.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ChunkHit>, ApiError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Case-sensitive substring search over chunk text, for debugging the
    /// knowledge base. Ordered by insertion.
    async fn text_search(&self, pattern: &str, limit: usize) -> Result<Vec<StoredChunk>, ApiError>;
}

/// Cosine similarity of two vectors, 0.0 when either is degenerate.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let vec = [1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&vec, &vec), 1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
    }

    #[test]
    fn cosine_handles_degenerate_inputs() {
        assert!(approx_eq(cosine_similarity(&[], &[]), 0.0));
        assert!(approx_eq(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0));
        assert!(approx_eq(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0));
    }
}
