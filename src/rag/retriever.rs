//! Retrieval — query embedding plus index search.

use std::sync::Arc;

use serde::Serialize;

use super::embedder::Embedder;
use super::store::{StoredChunk, VectorStore};
use crate::core::errors::ApiError;

/// A chunk returned for one query. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk: StoredChunk,
    pub score: f32,
    /// 0-based position in the ranked result list.
    pub rank: usize,
}

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed the query and return the top `k` chunks, ranked.
    ///
    /// `k == 0` is a caller error. An unavailable embedding capability
    /// propagates as `ApiError::Embedding`; without a query vector no
    /// meaningful retrieval is possible.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, ApiError> {
        if k == 0 {
            return Err(ApiError::Config(
                "must request at least one result".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.store.search(&query_embedding, k).await?;

        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| RetrievedChunk {
                chunk: hit.chunk,
                score: hit.score,
                rank,
            })
            .collect())
    }
}
