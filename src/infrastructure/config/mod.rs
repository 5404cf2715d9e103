use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::{info, warn};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::settings::AppSettings;
use crate::infrastructure::security::keyring::KeyringManager;

pub const CONFIG_FILE: &str = "datainsight.toml";
pub const CONFIG_PATH_ENV: &str = "DATAINSIGHT_CONFIG";
pub const ENV_PREFIX: &str = "DATAINSIGHT_";

const KEYRING_SERVICE: &str = "DataInsight";
const API_KEY_ENTRY: &str = "gemini";

pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    /// Defaults, then the TOML file, then `DATAINSIGHT_*` variables (`__` nests)
    pub fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    pub fn extract(figment: &Figment) -> Result<AppSettings> {
        let settings: AppSettings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings once at startup and attach the API credential to the LLM config
    pub fn load(&self) -> Result<AppSettings> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!(error = %err, "Failed to load .env file");
            }
        }

        let config_path = Self::config_path();
        let mut settings = Self::extract(&Self::figment(&config_path))?;

        match self.resolve_api_key(&settings) {
            Ok(api_key) => settings.llm.api_key = Some(api_key),
            Err(err) => warn!(error = %err, "No API key available; analysis requests will fail"),
        }

        info!(
            config_path = %config_path.display(),
            model = %settings.llm.model,
            date_column = settings.date_column().unwrap_or("<unset>"),
            "Settings loaded"
        );

        Ok(settings)
    }

    /// Configured key first, then the OS keyring
    pub fn resolve_api_key(&self, settings: &AppSettings) -> Result<String> {
        let configured = settings
            .api_key
            .as_ref()
            .or(settings.llm.api_key.as_ref())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if let Some(api_key) = configured {
            return Ok(api_key);
        }

        self.keyring.get_secret(API_KEY_ENTRY)?.ok_or_else(|| {
            AppError::ConfigError(
                "API key not found. Please set it in the settings.".to_string(),
            )
        })
    }

    pub fn save_api_key(&self, key: &str) -> Result<()> {
        self.keyring.set_secret(API_KEY_ENTRY, key)
    }

    pub fn delete_api_key(&self) -> Result<()> {
        self.keyring.delete_secret(API_KEY_ENTRY)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time_window::TimeWindow;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let settings = ConfigService::extract(&ConfigService::figment(Path::new(
                "missing.toml",
            )))
            .unwrap();
            assert_eq!(settings.sample_limit, 50);
            assert_eq!(settings.date_column(), None);
            assert_eq!(settings.default_window, TimeWindow::Month);
            assert_eq!(settings.llm.model, "gemini-2.5-flash");
            assert_eq!(settings.server.port, 3001);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "datainsight.toml",
                r#"
                    date_column = "Date"
                    default_window = "Week"
                    sample_limit = 20

                    [llm]
                    model = "gemini-2.0-flash"
                "#,
            )?;
            jail.set_env("DATAINSIGHT_SAMPLE_LIMIT", "30");
            jail.set_env("DATAINSIGHT_API_KEY", "from-env");
            jail.set_env("DATAINSIGHT_SERVER__PORT", "8080");

            let settings =
                ConfigService::extract(&ConfigService::figment(Path::new("datainsight.toml")))
                    .unwrap();
            assert_eq!(settings.date_column(), Some("Date"));
            assert_eq!(settings.default_window, TimeWindow::Week);
            assert_eq!(settings.sample_limit, 30);
            assert_eq!(settings.llm.model, "gemini-2.0-flash");
            assert_eq!(settings.server.port, 8080);
            assert_eq!(settings.api_key.as_deref(), Some("from-env"));

            let api_key = ConfigService::new().resolve_api_key(&settings).unwrap();
            assert_eq!(api_key, "from-env");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_sample_limit_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("DATAINSIGHT_SAMPLE_LIMIT", "0");
            let result = ConfigService::extract(&ConfigService::figment(Path::new("none.toml")));
            assert!(matches!(result, Err(AppError::ValidationError(_))));
            Ok(())
        });
    }

    #[test]
    fn test_blank_date_column_is_unset() {
        let settings = AppSettings {
            date_column: Some("   ".to_string()),
            ..AppSettings::default()
        };
        assert_eq!(settings.date_column(), None);
    }
}
