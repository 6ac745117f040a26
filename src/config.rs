//! Configuration types for the journal analysis service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the murmur server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Hosted inference endpoint settings.
    pub inference: InferenceConfig,
    /// Static resource locations.
    pub resources: ResourceConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (use `0.0.0.0` to serve beyond localhost).
    pub host: String,
    /// Port to bind (0 = auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7860,
        }
    }
}

/// Hosted inference endpoint configuration.
///
/// All three analysis steps go through the same inference gateway; only
/// the model IDs differ. The credential is supplied per request by the
/// caller, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the inference gateway.
    pub base_url: String,
    /// Emotion classification model ID.
    pub emotion_model: String,
    /// Sentiment classification model ID.
    pub sentiment_model: String,
    /// Generative feedback model ID.
    pub feedback_model: String,
    /// Per-request timeout in seconds for remote calls.
    pub timeout_secs: u64,
    /// Output-length cap for generated feedback.
    pub max_feedback_tokens: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_owned(),
            emotion_model: "SamLowe/roberta-base-go_emotions".to_owned(),
            sentiment_model: "cardiffnlp/twitter-xlm-roberta-base-sentiment".to_owned(),
            feedback_model: "mistralai/Mistral-7B-Instruct-v0.3".to_owned(),
            timeout_secs: 30,
            max_feedback_tokens: 500,
        }
    }
}

/// Locations of the static resources loaded once at boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Default system prompt for feedback generation.
    pub prompt_path: PathBuf,
    /// Insight dataset (emotion → topic + redirections).
    pub insights_path: PathBuf,
    /// Random writing-prompt dataset.
    pub random_texts_path: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            prompt_path: PathBuf::from("prompts/feedback.md"),
            insights_path: PathBuf::from("datasets/insights.json"),
            random_texts_path: PathBuf::from("datasets/random_texts.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::JournalError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::JournalError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/murmur/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("murmur").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("murmur")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/murmur-config/config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 7860);
        assert_eq!(config.inference.timeout_secs, 30);
        assert_eq!(config.inference.max_feedback_tokens, 500);
        assert!(config.inference.base_url.starts_with("https://"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.server.port = 9000;
        config.inference.emotion_model = "acme/emotions".to_owned();
        config.resources.prompt_path = PathBuf::from("/srv/prompt.md");
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 9000);
        assert_eq!(loaded.inference.emotion_model, "acme/emotions");
        assert_eq!(loaded.resources.prompt_path, PathBuf::from("/srv/prompt.md"));
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = AppConfig::from_file(std::path::Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 8123);
        assert_eq!(loaded.server.host, "127.0.0.1");
        assert_eq!(
            loaded.inference.sentiment_model,
            "cardiffnlp/twitter-xlm-roberta-base-sentiment"
        );
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = AppConfig::default_config_path();
        assert!(path.ends_with("murmur/config.toml") || path.ends_with("config.toml"));
    }
}
