pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiChatProvider;
pub use provider::GenerationProvider;
pub use types::ChatMessage;
