use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_CHARS: usize = 6;
const DEFAULT_TIMEOUT_MS: u64 = 150;
const DEFAULT_MIN_VISIBLE_MS: u64 = 800;
const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Short-fragment aggregation for streamed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub enabled: bool,
    #[serde(alias = "maxChars")]
    pub max_chars: usize,
    #[serde(alias = "timeoutMs")]
    pub timeout_ms: u64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_chars: DEFAULT_MAX_CHARS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl AggregateConfig {
    /// Flush threshold in characters; zero falls back to the default.
    pub fn threshold(&self) -> usize {
        if self.max_chars == 0 {
            DEFAULT_MAX_CHARS
        } else {
            self.max_chars
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkingConfig {
    /// How long a thinking panel stays on screen at minimum before an
    /// automatic teardown removes it.
    pub min_visible_ms: u64,
    /// Period of the elapsed-time caption refresh.
    pub tick_interval_ms: u64,
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            min_visible_ms: DEFAULT_MIN_VISIBLE_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

/// Messages a fresh conversation starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub system: String,
    pub greeting: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            system: "You are an AI assistant. Keep answers as concise as possible.\n\
                     If tools are available, decide for yourself whether they are needed."
                .to_string(),
            greeting: "Hello! I'm your AI assistant. How can I help you?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub aggregate: AggregateConfig,
    pub thinking: ThinkingConfig,
    pub seed: SeedConfig,
    pub history_dir: Option<PathBuf>,
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".chat_tree")
}

fn app_config_json_path() -> PathBuf {
    app_dir().join("config.json")
}

/// Default location of persisted conversations.
pub fn default_history_dir() -> PathBuf {
    app_dir().join("history")
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl ChatConfig {
    /// Defaults, then the user JSON file or `./config.toml`, then environment
    /// overrides. Unreadable files are skipped.
    pub fn load() -> Self {
        let mut config = ChatConfig::default();

        let mut loaded = false;
        let json_path = app_config_json_path();
        if json_path.exists() {
            match Self::from_path(&json_path) {
                Ok(file_config) => {
                    config = file_config;
                    loaded = true;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %json_path.display(),
                        error = %e,
                        "Ignoring unreadable config"
                    );
                }
            }
        }

        if !loaded && Path::new(CONFIG_FILE_PATH).exists() {
            match Self::from_path(CONFIG_FILE_PATH) {
                Ok(file_config) => config = file_config,
                Err(e) => {
                    tracing::warn!(
                        path = CONFIG_FILE_PATH,
                        error = %e,
                        "Ignoring unreadable config"
                    );
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Reads one config file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: ChatConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unsupported config extension {other:?}"
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.thinking.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "thinking.tick_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(enabled) = lookup("CHAT_AGGREGATE_ENABLED") {
            self.aggregate.enabled = parse_bool_env(&enabled);
        }
        if let Some(max_chars) =
            lookup("CHAT_AGGREGATE_MAX_CHARS").and_then(|v| v.trim().parse().ok())
        {
            self.aggregate.max_chars = max_chars;
        }
        if let Some(timeout) =
            lookup("CHAT_AGGREGATE_TIMEOUT_MS").and_then(|v| v.trim().parse().ok())
        {
            self.aggregate.timeout_ms = timeout;
        }
        if let Some(dir) = lookup("CHAT_HISTORY_DIR") {
            self.history_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn history_dir(&self) -> PathBuf {
        self.history_dir.clone().unwrap_or_else(default_history_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn parse_bool_env_true_values() {
        for value in ["1", "true", "TRUE", " yes ", "Y", "on"] {
            assert!(parse_bool_env(value), "value {value:?} should be true");
        }
    }

    #[test]
    fn parse_bool_env_false_values() {
        for value in ["0", "false", "no", "off", "", "  "] {
            assert!(!parse_bool_env(value), "value {value:?} should be false");
        }
    }

    #[test]
    fn defaults_match_stream_policy() {
        let config = ChatConfig::default();
        assert!(config.aggregate.enabled);
        assert_eq!(config.aggregate.max_chars, 6);
        assert_eq!(config.aggregate.timeout_ms, 150);
        assert_eq!(config.thinking.min_visible_ms, 800);
        assert_eq!(config.thinking.tick_interval_ms, 1000);
    }

    #[test]
    fn zero_threshold_falls_back_to_default() {
        let config = AggregateConfig {
            max_chars: 0,
            ..Default::default()
        };
        assert_eq!(config.threshold(), 6);
    }

    #[test]
    fn aggregate_accepts_camel_case_keys() {
        let config: AggregateConfig =
            serde_json::from_str(r#"{"enabled": false, "maxChars": 12, "timeoutMs": 40}"#).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.max_chars, 12);
        assert_eq!(config.timeout_ms, 40);
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("CHAT_AGGREGATE_ENABLED", "off"),
            ("CHAT_AGGREGATE_MAX_CHARS", "10"),
            ("CHAT_AGGREGATE_TIMEOUT_MS", "not a number"),
            ("CHAT_HISTORY_DIR", "/tmp/chats"),
        ]
        .into_iter()
        .collect();

        let mut config = ChatConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert!(!config.aggregate.enabled);
        assert_eq!(config.aggregate.max_chars, 10);
        assert_eq!(config.aggregate.timeout_ms, 150);
        assert_eq!(config.history_dir(), PathBuf::from("/tmp/chats"));
    }

    #[test]
    fn from_path_reads_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[aggregate]\nmax_chars = 20\n\n[thinking]\nmin_visible_ms = 500").unwrap();

        let config = ChatConfig::from_path(&path).unwrap();
        assert_eq!(config.aggregate.max_chars, 20);
        assert_eq!(config.aggregate.timeout_ms, 150);
        assert_eq!(config.thinking.min_visible_ms, 500);
        assert_eq!(config.seed, SeedConfig::default());
    }

    #[test]
    fn from_path_rejects_zero_tick_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"thinking": {"tick_interval_ms": 0}}"#).unwrap();

        assert!(matches!(
            ChatConfig::from_path(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
