//! Configuration loading, validation, and management for Recollect.
//!
//! Loads configuration from `~/.recollect/config.toml` with environment
//! variable overrides. Validates all settings at startup. The loaded value
//! is handed to the agent builder explicitly; nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.recollect/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Heartbeat and inference settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tool execution settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Memory tier configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Prompt template configuration
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Names this agent instance; persisted core memory is keyed by it.
    /// A fresh id is generated when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    /// Seconds between two runs of the same cycle
    #[serde(default = "default_heartrate_secs")]
    pub heartrate_secs: u64,

    /// How often the scheduler checks due-times, in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Upper bound on a single inference call
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,
}

fn default_heartrate_secs() -> u64 {
    60
}
fn default_tick_millis() -> u64 {
    1000
}
fn default_inference_timeout_secs() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instance_id: None,
            heartrate_secs: default_heartrate_secs(),
            tick_millis: default_tick_millis(),
            inference_timeout_secs: default_inference_timeout_secs(),
        }
    }
}

impl AgentConfig {
    pub fn heartrate(&self) -> Duration {
        Duration::from_secs(self.heartrate_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Per-call execution timeout
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,

    /// Tool output beyond this many characters is truncated
    #[serde(default = "default_max_result_chars")]
    pub max_result_chars: usize,
}

fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_max_result_chars() -> usize {
    10_000
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout_secs(),
            max_result_chars: default_max_result_chars(),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which memory tier implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryBackendKind {
    /// Process-local, lost on exit
    #[default]
    InMemory,
    /// JSONL tiers and a JSON core file under `directory`
    File,
    /// Writes are discarded, searches return nothing
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub backend: MemoryBackendKind,

    /// Root directory for the file backend
    #[serde(default = "default_memory_directory")]
    pub directory: PathBuf,

    /// Results per search page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_memory_directory() -> PathBuf {
    AppConfig::config_dir().join("memory")
}
fn default_page_size() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackendKind::default(),
            directory: default_memory_directory(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Directory of `<name>.hbs` files overriding the built-in templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.recollect/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `RECOLLECT_INSTANCE_ID`
    /// - `RECOLLECT_HEARTRATE_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".recollect")
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(id) = lookup("RECOLLECT_INSTANCE_ID") {
            self.agent.instance_id = Some(id);
        }

        if let Some(raw) = lookup("RECOLLECT_HEARTRATE_SECS") {
            self.agent.heartrate_secs = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "RECOLLECT_HEARTRATE_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.heartrate_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.heartrate_secs must be > 0".into(),
            ));
        }

        if self.agent.tick_millis == 0 {
            return Err(ConfigError::ValidationError(
                "agent.tick_millis must be > 0".into(),
            ));
        }

        if self.agent.inference_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.inference_timeout_secs must be > 0".into(),
            ));
        }

        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.timeout_secs must be > 0".into(),
            ));
        }

        if self.memory.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "memory.page_size must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.heartrate_secs, 60);
        assert_eq!(config.tools.max_result_chars, 10_000);
        assert_eq!(config.memory.backend, MemoryBackendKind::InMemory);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent.heartrate_secs, config.agent.heartrate_secs);
        assert_eq!(parsed.memory.page_size, config.memory.page_size);
    }

    #[test]
    fn zero_heartrate_rejected() {
        let mut config = AppConfig::default();
        config.agent.heartrate_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut config = AppConfig::default();
        config.memory.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.agent.tick_millis, 1000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[agent]
heartrate_secs = 5

[memory]
backend = "file"
directory = "/var/lib/recollect"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.heartrate_secs, 5);
        assert_eq!(config.agent.inference_timeout_secs, 120);
        assert_eq!(config.memory.backend, MemoryBackendKind::File);
        assert_eq!(config.memory.directory, PathBuf::from("/var/lib/recollect"));
        assert_eq!(config.tools.timeout_secs, 30);
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[memory]\nbackend = \"postgres\"\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_file_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\ntick_millis = 0\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("RECOLLECT_INSTANCE_ID", "agent-7"),
            ("RECOLLECT_HEARTRATE_SECS", "15"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.agent.instance_id.as_deref(), Some("agent-7"));
        assert_eq!(config.agent.heartrate_secs, 15);
    }

    #[test]
    fn non_numeric_heartrate_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "RECOLLECT_HEARTRATE_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn durations_follow_settings() {
        let config = AppConfig::default();
        assert_eq!(config.agent.heartrate(), Duration::from_secs(60));
        assert_eq!(config.agent.tick(), Duration::from_millis(1000));
        assert_eq!(config.tools.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("heartrate_secs"));
        assert!(toml_str.contains("in_memory"));
    }
}
