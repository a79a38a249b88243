//! Deterministic capability doubles shared across the rag test modules.

use async_trait::async_trait;

use super::embedder::Embedder;
use crate::core::errors::ApiError;

/// Embeds text as a 26-dimension letter-frequency vector. Deterministic and
/// cheap, with meaningful cosine similarity between related texts.
pub(crate) struct BagOfLettersEmbedder;

#[async_trait]
impl Embedder for BagOfLettersEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vector = vec![0.0f32; 26];
        for c in text.chars().flat_map(|c| c.to_lowercase()) {
            if c.is_ascii_lowercase() {
                vector[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        Ok(vector)
    }
}
