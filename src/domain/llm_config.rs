use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Google,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    #[validate(length(min = 1))]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Google,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            max_tokens: None,
            temperature: None,
        }
    }
}
