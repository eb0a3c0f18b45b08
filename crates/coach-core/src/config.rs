use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Stand-in left in the build until the deploy step bakes in a real URL
pub const ENDPOINT_PLACEHOLDER: &str = "<置換後URL>";

pub const DEFAULT_SYSTEM_PROMPT: &str = "あなたは優しい健康コーチです。80文字以内の日本語で答えて。";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// What each request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    /// The whole transcript: `{"messages": [...]}`
    #[default]
    History,
    /// Only the latest user message: `{"message": "..."}`
    Single,
}

impl PayloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadMode::History => "history",
            PayloadMode::Single => "single",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "history" => Some(PayloadMode::History),
            "single" => Some(PayloadMode::Single),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub system_prompt: String,
    pub mode: PayloadMode,
    /// Request timeout in seconds, 0 waits forever
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            endpoint: option_env!("COACH_CHAT_ENDPOINT")
                .unwrap_or(ENDPOINT_PLACEHOLDER)
                .to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            mode: PayloadMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        log::info!("[config] Loaded {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Endpoint to post to, refusing the unsubstituted placeholder
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() || endpoint == ENDPOINT_PLACEHOLDER {
            let path = Self::get_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.json".to_string());
            return Err(ConfigError::EndpointNotSet(path));
        }
        Ok(endpoint)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("coach-chat").join("config.json"))
    }
}
