use super::LLMClient;
use crate::domain::chat::ChatTurn;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
            role: role.map(str::to_string),
        }
    }
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize, Default)]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate; empty when the model returned none
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct GeminiModelsResponse {
    models: Option<Vec<GeminiModelInfo>>,
}

#[derive(Deserialize)]
struct GeminiModelInfo {
    name: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigError(
                    "API key not found. Please set it in the settings.".to_string(),
                )
            })
    }

    fn endpoint(config: &LLMConfig, suffix: &str) -> Result<Url> {
        let base_url = config.base_url.trim_end_matches('/');
        Url::parse(&format!("{}{}", base_url, suffix))
            .map_err(|e| AppError::ConfigError(format!("Invalid Gemini base URL: {}", e)))
    }

    /// Transport error text without the request URL
    fn request_error(err: reqwest::Error) -> AppError {
        AppError::LLMError(format!("Request failed: {}", err.without_url()))
    }

    fn generation_config<'a>(config: &LLMConfig) -> GenerationConfig<'a> {
        GenerationConfig {
            temperature: config.temperature.map(f64::from),
            max_output_tokens: config.max_tokens,
            ..Default::default()
        }
    }

    async fn send(&self, config: &LLMConfig, body: &GeminiRequest<'_>) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let model_id = config.model.trim();
        let url = Self::endpoint(config, &format!("/{}:generateContent", model_id))?;

        debug!(model = model_id, turns = body.contents.len(), "Sending Gemini request");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(Self::request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, model = model_id, "Gemini request rejected");
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e.without_url())))?;

        Ok(json.text())
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate_json(
        &self,
        config: &LLMConfig,
        prompt: &str,
        schema: &Value,
    ) -> Result<String> {
        let body = GeminiRequest {
            contents: vec![GeminiContent::text(Some("user"), prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json"),
                response_schema: Some(schema),
                ..Self::generation_config(config)
            }),
        };

        self.send(config, &body).await
    }

    async fn chat(
        &self,
        config: &LLMConfig,
        system: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String> {
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|turn| GeminiContent::text(Some(turn.role.as_str()), &turn.text))
            .collect();
        contents.push(GeminiContent::text(Some("user"), message));

        let system_instruction = if system.trim().is_empty() {
            None
        } else {
            Some(GeminiContent::text(None, system))
        };

        let body = GeminiRequest {
            contents,
            system_instruction,
            generation_config: Some(Self::generation_config(config)),
        };

        self.send(config, &body).await
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        let api_key = Self::api_key(config)?;
        let url = Self::endpoint(config, "")?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(Self::request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: GeminiModelsResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e.without_url())))?;

        let models = json
            .models
            .unwrap_or_default()
            .into_iter()
            .map(|model| {
                model
                    .name
                    .strip_prefix("models/")
                    .unwrap_or(model.name.as_str())
                    .to_string()
            })
            .collect();

        Ok(models)
    }
}
