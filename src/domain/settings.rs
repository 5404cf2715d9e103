use crate::domain::llm_config::LLMConfig;
use crate::domain::time_window::TimeWindow;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_SAMPLE_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

/// Settings read once at startup and passed down by reference
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppSettings {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Column holding row dates; unset disables date filtering
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub default_window: TimeWindow,
    #[validate(range(min = 1, max = 1000))]
    pub sample_limit: usize,
    #[validate(nested)]
    pub llm: LLMConfig,
    #[validate(nested)]
    pub server: ServerConfig,
}

impl AppSettings {
    pub fn date_column(&self) -> Option<&str> {
        self.date_column
            .as_deref()
            .map(str::trim)
            .filter(|column| !column.is_empty())
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            date_column: None,
            default_window: TimeWindow::default(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            llm: LLMConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
