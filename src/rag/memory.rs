//! In-memory vector store.
//!
//! Brute-force cosine search over a `RwLock`-guarded vec. The whole batch is
//! pushed under one write guard, so readers never see a partial insert. No
//! lock is held across any await point.

use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::store::{cosine_similarity, ChunkHit, StoredChunk, VectorStore};
use crate::core::errors::ApiError;

struct Entry {
    chunk: StoredChunk,
    embedding: Vec<f32>,
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn insert_batch(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<usize, ApiError> {
        let inserted = items.len();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.extend(
            items
                .into_iter()
                .map(|(chunk, embedding)| Entry { chunk, embedding }),
        );
        Ok(inserted)
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ChunkHit>, ApiError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        // Insertion position doubles as the tie-break key.
        let mut scored: Vec<(usize, ChunkHit)> = entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                (
                    pos,
                    ChunkHit {
                        chunk: entry.chunk.clone(),
                        score,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len())
    }

    async fn text_search(&self, pattern: &str, limit: usize) -> Result<Vec<StoredChunk>, ApiError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(Vec::new());
        }

        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .iter()
            .filter(|entry| entry.chunk.text.contains(pattern))
            .take(limit)
            .map(|entry| entry.chunk.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn make_chunk(id: &str, text: &str) -> StoredChunk {
        StoredChunk {
            chunk_id: id.to_string(),
            text: text.to_string(),
            document_id: "doc".to_string(),
            title: "Notes".to_string(),
            source: "notes.txt".to_string(),
            sequence_index: 0,
        }
    }

    #[tokio::test]
    async fn search_on_empty_index_returns_empty() {
        let store = MemoryStore::new();
        let hits = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_orders_by_descending_similarity() {
        let store = MemoryStore::new();
        store
            .insert_batch(vec![
                (make_chunk("far", "far"), vec![0.0, 1.0]),
                (make_chunk("near", "near"), vec![1.0, 0.1]),
                (make_chunk("mid", "mid"), vec![0.6, 0.6]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[tokio::test]
    async fn equal_scores_tie_break_by_insertion_order() {
        let store = MemoryStore::new();
        store
            .insert_batch(vec![
                (make_chunk("first", "a"), vec![1.0, 0.0]),
                (make_chunk("second", "b"), vec![1.0, 0.0]),
                (make_chunk("third", "c"), vec![2.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk.chunk_id.as_str()).collect();
        // All three are cosine-identical; earlier inserts win.
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn search_never_returns_more_than_requested_or_stored() {
        let store = MemoryStore::new();
        store
            .insert_batch(vec![
                (make_chunk("a", "a"), vec![1.0]),
                (make_chunk("b", "b"), vec![1.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.search(&[1.0], 1).await.unwrap().len(), 1);
        assert_eq!(store.search(&[1.0], 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn double_insert_doubles_the_stored_count() {
        let store = MemoryStore::new();
        let batch = vec![
            (make_chunk("a", "same text"), vec![1.0]),
            (make_chunk("b", "same text"), vec![1.0]),
        ];
        store.insert_batch(batch.clone()).await.unwrap();
        store.insert_batch(batch).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 4);
        assert_eq!(store.search(&[1.0], 100).await.unwrap().len(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_search_never_observes_a_partial_batch() {
        const BATCH_SIZE: usize = 8;
        const BATCHES: usize = 50;

        let store = Arc::new(MemoryStore::new());

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for batch_no in 0..BATCHES {
                    let batch: Vec<_> = (0..BATCH_SIZE)
                        .map(|i| {
                            (
                                make_chunk(&format!("c{}-{}", batch_no, i), "text"),
                                vec![1.0, 0.0],
                            )
                        })
                        .collect();
                    store.insert_batch(batch).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                loop {
                    let count = store.count().await.unwrap();
                    assert_eq!(count % BATCH_SIZE, 0, "count saw a partial batch");
                    let hits = store.search(&[1.0, 0.0], usize::MAX).await.unwrap();
                    assert_eq!(hits.len() % BATCH_SIZE, 0, "search saw a partial batch");
                    if count == BATCH_SIZE * BATCHES {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(store.count().await.unwrap(), BATCH_SIZE * BATCHES);
    }

    #[tokio::test]
    async fn text_search_matches_substrings() {
        let store = MemoryStore::new();
        store
            .insert_batch(vec![
                (make_chunk("a", "Rust memory safety"), vec![1.0]),
                (make_chunk("b", "Python tips"), vec![1.0]),
            ])
            .await
            .unwrap();

        let found = store.text_search("memory", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].chunk_id, "a");
        assert!(store.text_search("  ", 10).await.unwrap().is_empty());
    }
}
