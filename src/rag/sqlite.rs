//! SQLite-backed vector store.
//!
//! Durable index using SQLite for chunk rows and brute-force cosine
//! similarity at query time. Embeddings are stored as little-endian f32
//! BLOBs. Batches are inserted inside a single transaction, so a concurrent
//! search sees either the whole batch or none of it. Rowid order is the
//! tie-break for equal scores (earlier insert wins).

use std::cmp::Ordering;
use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{cosine_similarity, ChunkHit, StoredChunk, VectorStore};
use crate::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::storage)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                source TEXT NOT NULL DEFAULT '',
                sequence_index INTEGER NOT NULL DEFAULT 0,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::storage)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        let sequence_index: i64 = row.get("sequence_index");
        StoredChunk {
            chunk_id: row.get("chunk_id"),
            text: row.get("text"),
            document_id: row.get("document_id"),
            title: row.get("title"),
            source: row.get("source"),
            sequence_index: sequence_index.max(0) as usize,
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn insert_batch(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<usize, ApiError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::storage)?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);
            sqlx::query(
                "INSERT INTO chunks (chunk_id, document_id, title, source, sequence_index, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.document_id)
            .bind(&chunk.title)
            .bind(&chunk.source)
            .bind(chunk.sequence_index as i64)
            .bind(&chunk.text)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::storage)?;
        }

        tx.commit().await.map_err(ApiError::storage)?;
        Ok(items.len())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ChunkHit>, ApiError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT rowid, chunk_id, document_id, title, source, sequence_index, text, embedding
             FROM chunks
             ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::storage)?;

        let mut scored: Vec<(i64, ChunkHit)> = rows
            .iter()
            .map(|row| {
                let rowid: i64 = row.get("rowid");
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = cosine_similarity(query_embedding, &stored);

                (
                    rowid,
                    ChunkHit {
                        chunk: Self::row_to_chunk(row),
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
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::storage)?;
        Ok(count as usize)
    }

    async fn text_search(&self, pattern: &str, limit: usize) -> Result<Vec<StoredChunk>, ApiError> {
        let escaped = format!("%{}%", pattern.trim());
        if escaped == "%%" {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT chunk_id, document_id, title, source, sequence_index, text
             FROM chunks
             WHERE text LIKE ?1
             ORDER BY rowid
             LIMIT ?2",
        )
        .bind(&escaped)
        .bind(limit.max(1) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::storage)?;

        Ok(rows.iter().map(Self::row_to_chunk).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (TempDir, SqliteVectorStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteVectorStore::with_path(dir.path().join("index.db"))
            .await
            .unwrap();
        (dir, store)
    }

    fn make_chunk(id: &str, text: &str, seq: usize) -> StoredChunk {
        StoredChunk {
            chunk_id: id.to_string(),
            text: text.to_string(),
            document_id: "doc-1".to_string(),
            title: "Biology notes".to_string(),
            source: "biology.pdf".to_string(),
            sequence_index: seq,
        }
    }

    #[tokio::test]
    async fn insert_and_search_roundtrip() {
        let (_dir, store) = test_store().await;

        store
            .insert_batch(vec![(make_chunk("c1", "Hello world", 0), vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let hits = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.chunk_id, "c1");
        assert_eq!(hits[0].chunk.title, "Biology notes");
        assert!(hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn search_on_empty_database_returns_empty() {
        let (_dir, store) = test_store().await;
        assert!(store.search(&[1.0], 5).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn results_ordered_by_score_then_rowid() {
        let (_dir, store) = test_store().await;

        store
            .insert_batch(vec![
                (make_chunk("tie-a", "a", 0), vec![1.0, 0.0]),
                (make_chunk("off", "b", 1), vec![0.0, 1.0]),
                (make_chunk("tie-b", "c", 2), vec![2.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["tie-a", "tie-b", "off"]);
    }

    #[tokio::test]
    async fn batches_accumulate_without_dedup() {
        let (_dir, store) = test_store().await;

        let first = vec![
            (make_chunk("a1", "same text", 0), vec![1.0]),
            (make_chunk("a2", "same text", 1), vec![1.0]),
        ];
        let second = vec![
            (make_chunk("b1", "same text", 0), vec![1.0]),
            (make_chunk("b2", "same text", 1), vec![1.0]),
        ];

        assert_eq!(store.insert_batch(first).await.unwrap(), 2);
        assert_eq!(store.insert_batch(second).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 4);
        assert_eq!(store.search(&[1.0], 100).await.unwrap().len(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_search_never_observes_a_partial_batch() {
        const BATCH_SIZE: usize = 4;
        const BATCHES: usize = 10;

        let (_dir, store) = test_store().await;
        let store = Arc::new(store);

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for batch_no in 0..BATCHES {
                    let batch: Vec<_> = (0..BATCH_SIZE)
                        .map(|i| {
                            (
                                make_chunk(&format!("c{}-{}", batch_no, i), "text", i),
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
    async fn text_search_filters_by_substring() {
        let (_dir, store) = test_store().await;

        store
            .insert_batch(vec![
                (make_chunk("c1", "Chlorophyll absorbs light", 0), vec![1.0]),
                (make_chunk("c2", "Mitosis has phases", 1), vec![1.0]),
            ])
            .await
            .unwrap();

        let found = store.text_search("light", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].chunk_id, "c1");
        assert!(store.text_search("", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn embedding_blob_roundtrip_preserves_values() {
        let original = vec![0.25f32, -1.5, 3.75, f32::MIN_POSITIVE];
        let bytes = SqliteVectorStore::serialize_embedding(&original);
        assert_eq!(SqliteVectorStore::deserialize_embedding(&bytes), original);
    }
}
