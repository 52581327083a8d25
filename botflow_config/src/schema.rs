use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// Defaults for slot history retention.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StateConfig {
    /// Historical entries kept per history-backed slot
    #[serde(default = "StateConfig::default_history_max_count")]
    pub history_max_count: usize,
    /// TTL in seconds for history entries; 0 disables the TTL
    #[serde(default)]
    pub history_expires_after_secs: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            history_max_count: Self::default_history_max_count(),
            history_expires_after_secs: 0,
        }
    }
}

impl StateConfig {
    fn default_history_max_count() -> usize {
        10
    }
}

/// Console channel settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChannelConfig {
    /// Conversation id used when none is supplied on the command line
    #[serde(default = "ChannelConfig::default_conversation")]
    pub default_conversation: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            default_conversation: Self::default_conversation(),
        }
    }
}

impl ChannelConfig {
    fn default_conversation() -> String {
        "console".to_string()
    }
}

impl Config {
    /// Load from `~/botflow/config.json`, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");

        if !config_path.exists() {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("botflow"))
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Write a template config file for editing.
    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let config_template = r#"{
  "state": {
    "history_max_count": 10,
    "history_expires_after_secs": 0
  },
  "channel": {
    "default_conversation": "console"
  }
}"#;

        std::fs::write(&config_path, config_template)?;
        println!("Created config file at: {}", config_path.display());
        Ok(())
    }
}
