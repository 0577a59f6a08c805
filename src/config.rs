use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SubverseError};

// Default values for translation configuration
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash-lite".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_batch_size() -> usize {
    20
}

fn default_concurrency() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_binary_path() -> String {
    "ffmpeg".to_string()
}

fn default_video_extensions() -> Vec<String> {
    ["mkv", "mp4", "avi", "mov"].iter().map(|s| s.to_string()).collect()
}

fn default_subtitle_extensions() -> Vec<String> {
    vec!["srt".to_string()]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Base URL of the Generative Language API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model used for translation
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature sent with every request
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum number of unique subtitle texts per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum number of batch requests in flight; 1 keeps the run sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    #[serde(default = "default_binary_path")]
    pub binary_path: String,
    /// File extensions offered as video inputs
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    /// File extensions offered as subtitle inputs
    #[serde(default = "default_subtitle_extensions")]
    pub subtitle_extensions: Vec<String>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            video_extensions: default_video_extensions(),
            subtitle_extensions: default_subtitle_extensions(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubverseError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubverseError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubverseError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubverseError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values the translation run cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.translate.batch_size == 0 {
            return Err(SubverseError::Config("batch_size must be at least 1".to_string()));
        }
        if self.translate.concurrency == 0 {
            return Err(SubverseError::Config("concurrency must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.translate.temperature) {
            return Err(SubverseError::Config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.translate.temperature
            )));
        }
        Ok(())
    }
}

impl TranslateConfig {
    /// Read the API key from the configured environment variable
    pub fn resolve_api_key(&self) -> Result<String> {
        api_key_from(&self.api_key_env, std::env::var(&self.api_key_env).ok())
    }
}

fn api_key_from(var_name: &str, value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(SubverseError::MissingCredential(var_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.translate.batch_size, 20);
        assert_eq!(config.translate.concurrency, 1);
        assert!((config.translate.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.translate.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.media.binary_path, "ffmpeg");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subverse.toml");
        std::fs::write(&path, "[translate]\nbatch_size = 5\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.translate.batch_size, 5);
        assert_eq!(config.translate.model, "gemini-2.0-flash-lite");
        assert_eq!(config.media.video_extensions.len(), 4);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subverse.toml");
        let mut config = Config::default();
        config.translate.model = "gemini-1.5-pro".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.translate.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.translate.batch_size = 0;
        assert!(matches!(config.validate(), Err(SubverseError::Config(_))));

        let mut config = Config::default();
        config.translate.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_credential() {
        assert!(matches!(
            api_key_from("GEMINI_API_KEY", None),
            Err(SubverseError::MissingCredential(name)) if name == "GEMINI_API_KEY"
        ));
        assert!(api_key_from("GEMINI_API_KEY", Some("   ".to_string())).is_err());
        assert_eq!(api_key_from("K", Some(" abc ".to_string())).unwrap(), "abc");
    }
}
