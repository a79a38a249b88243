use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Text-generation capability.
///
/// The orchestrator makes exactly one call per request and treats any error,
/// including timeout expiry, as the trigger for its fallback transition.
/// Implementations must be swappable without touching other components.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ApiError>;
}
