use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{AppConfig, AppPaths};
use crate::llm::{GenerationProvider, OpenAiChatProvider};
use crate::rag::{Embedder, HttpEmbedder, RagService, RagSettings, SqliteVectorStore, VectorStore};

/// Process-wide state, built once at startup. Tests construct their own
/// `RagService` instances instead of sharing this.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub rag: RagService,
    #[allow(dead_code)]
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let config = AppConfig::load(&paths)?;

        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(&paths).await?);
        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&config.embedding)?);
        let generator: Arc<dyn GenerationProvider> =
            Arc::new(OpenAiChatProvider::new(&config.generation)?);

        let rag = RagService::new(store, embedder, generator, RagSettings::from(&config));

        Ok(Arc::new(AppState {
            paths,
            config,
            rag,
            started_at: Utc::now(),
        }))
    }
}
