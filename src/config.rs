//! Application paths and configuration.
//!
//! Paths are discovered from the environment with sensible fallbacks;
//! tunables load from an optional `config.toml` in the data directory and
//! fall back to defaults otherwise.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let data_dir = discover_data_dir();
        let log_dir = data_dir.join("logs");
        let db_path = data_dir.join("studymate.db");
        let config_path = data_dir.join("config.toml");

        for dir in [&data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            data_dir,
            log_dir,
            db_path,
            config_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("STUDYMATE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("studymate_data")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between successive chunks.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of chunks retrieved per query.
    pub top_k: usize,
    /// Maximum assembled context length in characters.
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_context_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint base URL.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234".to_string(),
            model: "nomic-embed-text-v1.5".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat completions endpoint base URL.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234".to_string(),
            model: "llama-3.1-8b-instruct".to_string(),
            timeout_secs: 60,
            temperature: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8787 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load config from disk, falling back to defaults if the file is absent.
    pub fn load(paths: &AppPaths) -> Result<Self, ApiError> {
        if !paths.config_path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&paths.config_path)
            .map_err(|e| ApiError::Config(format!("failed to read config.toml: {}", e)))?;
        toml::from_str(&raw)
            .map_err(|e| ApiError::Config(format!("failed to parse config.toml: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_chunking_parameters() {
        let config = AppConfig::default();
        assert!(config.chunking.overlap < config.chunking.chunk_size);
        assert!(config.retrieval.top_k > 0);
    }

    #[test]
    fn partial_config_file_keeps_defaults_for_missing_sections() {
        let parsed: AppConfig = toml::from_str("[chunking]\nchunk_size = 800\n").unwrap();
        assert_eq!(parsed.chunking.chunk_size, 800);
        assert_eq!(parsed.chunking.overlap, 100);
        assert_eq!(parsed.retrieval.top_k, 4);
    }
}
