//! Settings for the extraction CLI.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`,
//! with environment variables taking precedence.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::{
    ImageDetailLevel, ModelConfig, DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MODEL_NAME,
};

/// Settings errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Environment variable {0} is not set")]
    MissingToken(String),
    #[error("Cannot determine config directory")]
    ConfigDir,
    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Inference endpoint base URL
    pub endpoint: String,
    /// Model identifier
    pub model_name: String,
    /// `api-version` query parameter. Empty means none is sent.
    pub api_version: String,
    /// Name of the environment variable holding the bearer token
    pub token_env: String,
    /// Image to extract from
    pub image_path: String,
    /// Image format used in the data URL ("jpg", "png", ...). Empty means infer.
    pub image_format: String,
    /// Image detail level
    pub image_detail: ImageDetailLevel,
    /// Prompt language ("fr" or "en")
    pub lang: String,
    /// Maximum completion tokens (unset lets the service decide)
    pub max_tokens: Option<u32>,
    /// Sampling temperature (unset lets the service decide)
    pub temperature: Option<f32>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            image_path: "f1.jpg".to_string(),
            image_format: "jpg".to_string(),
            image_detail: ImageDetailLevel::Low,
            lang: "fr".to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "moderras", "vision-extract")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid settings file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut loaded: Self = serde_json::from_str(content)?;

        // Backfill required fields blanked out in older files
        let defaults = Self::default();
        if loaded.endpoint.is_empty() {
            loaded.endpoint = defaults.endpoint;
        }
        if loaded.model_name.is_empty() {
            loaded.model_name = defaults.model_name;
        }
        if loaded.token_env.is_empty() {
            loaded.token_env = defaults.token_env;
        }

        Ok(loaded)
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let dir = Self::config_dir().ok_or(SettingsError::ConfigDir)?;
        fs::create_dir_all(&dir)?;

        let path = dir.join("settings.json");
        fs::write(&path, serde_json::to_string_pretty(self)?)?;

        Ok(path)
    }

    /// Override settings from process environment variables.
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Override settings from a variable lookup. Unparseable values are ignored.
    pub fn apply_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MODEL_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = get("MODEL_NAME") {
            self.model_name = v;
        }
        if let Some(v) = get("MODEL_API_VERSION") {
            self.api_version = v;
        }
        if let Some(v) = get("MODEL_TOKEN_ENV") {
            self.token_env = v;
        }
        if let Some(v) = get("IMAGE_PATH") {
            self.image_path = v;
        }
        if let Some(v) = get("IMAGE_FORMAT") {
            self.image_format = v;
        }
        if let Some(detail) = get("IMAGE_DETAIL").and_then(|v| v.parse().ok()) {
            self.image_detail = detail;
        }
        if let Some(v) = get("EXTRACT_LANG") {
            self.lang = v;
        }
        if let Some(n) = get("MODEL_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = Some(n);
        }
        if let Some(t) = get("MODEL_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = Some(t);
        }

        self
    }

    /// Read the bearer token from the configured environment variable.
    pub fn read_token(&self) -> Result<String, SettingsError> {
        env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SettingsError::MissingToken(self.token_env.clone()))
    }

    /// Image format for the data URL, `None` to infer from the file extension.
    pub fn image_format(&self) -> Option<&str> {
        Some(self.image_format.trim()).filter(|f| !f.is_empty())
    }

    /// Build the model configuration.
    pub fn to_model_config(&self, token: impl Into<String>) -> ModelConfig {
        let mut config = ModelConfig::default()
            .with_endpoint(&self.endpoint)
            .with_api_key(token)
            .with_model_name(&self.model_name);
        config = match self.api_version.trim() {
            "" => config.without_api_version(),
            version => config.with_api_version(version),
        };
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        config
    }
}
