pub mod gemini;

use crate::domain::chat::ChatTurn;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde_json::Value;

pub use gemini::GeminiClient;

#[async_trait]
pub trait LLMClient {
    /// Single prompt answered as JSON matching `schema`
    async fn generate_json(
        &self,
        config: &LLMConfig,
        prompt: &str,
        schema: &Value,
    ) -> Result<String>;

    /// One conversational turn on top of prior `history`
    async fn chat(
        &self,
        config: &LLMConfig,
        system: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String>;

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>>;
}
