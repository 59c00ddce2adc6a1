//! Assistant configuration: a TOML file plus environment overrides for secrets.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::services::Contact;

pub const CONFIG_PATH_ENV: &str = "JARVIS_CONFIG";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const SERPAPI_KEY_ENV: &str = "SERPAPI_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub assistant: DialogueConfig,
    pub chat: ChatConfig,
    pub search: SearchConfig,
    pub hardware: HardwareConfig,
    pub automation: AutomationConfig,
    pub contacts: Vec<Contact>,
}

/// Conversation timing and speech surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub name: String,
    pub wake_phrase: String,
    /// Upper bound for one command capture.
    pub listen_timeout_secs: u64,
    /// Upper bound for the yes/no capture after a restatement.
    pub confirmation_timeout_secs: u64,
    /// Use the macOS `say` command instead of printing replies.
    pub voice: bool,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            name: "Jarvis".to_string(),
            wake_phrase: "hey jarvis".to_string(),
            listen_timeout_secs: 8,
            confirmation_timeout_secs: 5,
            voice: false,
        }
    }
}

impl DialogueConfig {
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://serpapi.com/search.json".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// JSON snapshot written by the hardware bridge.
    pub snapshot_path: Option<PathBuf>,
    /// Serial device streaming `VOL:`/`BTN:`/`DHT:` lines. Takes precedence
    /// over `snapshot_path` when both are set.
    pub serial_path: Option<PathBuf>,
    pub poll_interval_ms: u64,
    /// Forward knob changes to the system volume.
    pub follow_volume: bool,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            serial_path: None,
            poll_interval_ms: 100,
            follow_volume: true,
        }
    }
}

impl HardwareConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Log planned commands instead of running them.
    pub dry_run: bool,
}

impl AssistantConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolution order: explicit path, `JARVIS_CONFIG`, built-in defaults.
    /// Secrets from the environment always win over the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlays secrets from `lookup` (the process environment in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(OPENAI_KEY_ENV).filter(|k| !k.is_empty()) {
            self.chat.api_key = Some(key);
        }
        if let Some(key) = lookup(SERPAPI_KEY_ENV).filter(|k| !k.is_empty()) {
            self.search.api_key = Some(key);
        }
    }

    /// Both backends need keys; the assistant refuses to start without them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::Missing(OPENAI_KEY_ENV));
        }
        if self.search.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::Missing(SERPAPI_KEY_ENV));
        }
        if self.assistant.wake_phrase.trim().is_empty() {
            return Err(ConfigError::Missing("assistant.wake_phrase"));
        }
        Ok(())
    }
}
