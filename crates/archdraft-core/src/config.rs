use crate::error::{ArchdraftError, Result};
use crate::paths;
use gemini_agent::{AgentConfig, ClientConfig, GenerationConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentSettings
// ---------------------------------------------------------------------------

/// The `agent:` section. The API key is never stored here; it comes from
/// the environment at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_empty_retry_delay_ms")]
    pub empty_retry_delay_ms: u64,
    #[serde(default = "default_fallback")]
    pub fallback: bool,
    /// Natural language the model writes values in.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_base_url() -> String {
    gemini_agent::client::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    gemini_agent::client::DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1500
}

fn default_empty_retry_delay_ms() -> u64 {
    2000
}

fn default_fallback() -> bool {
    true
}

fn default_language() -> String {
    gemini_agent::prompt::DEFAULT_LANGUAGE.to_string()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            empty_retry_delay_ms: default_empty_retry_delay_ms(),
            fallback: default_fallback(),
            language: default_language(),
        }
    }
}

impl AgentSettings {
    /// Build the agent configuration, attaching `api_key`.
    pub fn to_agent_config(&self, api_key: Option<String>) -> AgentConfig {
        AgentConfig {
            client: ClientConfig {
                base_url: self.base_url.clone(),
                model: self.model.clone(),
                api_key,
                timeout: Duration::from_secs(self.timeout_secs),
            },
            generation: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                top_p: self.top_p,
                top_k: self.top_k,
            },
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
                empty_retry_delay: Duration::from_millis(self.empty_retry_delay_ms),
                fallback: self.fallback,
            },
            language: self.language.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentSettings,
}

fn default_version() -> u32 {
    1
}

fn default_database() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DB_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: default_database(),
            server: ServerConfig::default(),
            agent: AgentSettings::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ArchdraftError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(ArchdraftError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        paths::database_path(root, &self.database)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let agent = &self.agent;

        if agent.max_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "agent.max_attempts is 0; one attempt will still be made".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&agent.temperature) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "agent.temperature {} is outside 0.0..=2.0",
                    agent.temperature
                ),
            });
        }
        if !(0.0..=1.0).contains(&agent.top_p) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("agent.top_p {} is outside 0.0..=1.0", agent.top_p),
            });
        }
        if agent.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "agent.timeout_secs must be greater than 0".to_string(),
            });
        }
        if !agent.model.starts_with("models/") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "agent.model '{}' does not start with 'models/'",
                    agent.model
                ),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ArchdraftError::NotInitialized)
        ));
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.server.port, 3141);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.server.port = 8088;
        cfg.agent.language = "English".into();
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.server.port, 8088);
        assert_eq!(loaded.agent.language, "English");
        assert_eq!(loaded.agent.max_attempts, 3);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("agent:\n  model: models/gemini-2.5-pro\n").unwrap();
        assert_eq!(cfg.agent.model, "models/gemini-2.5-pro");
        assert_eq!(cfg.agent.top_k, 40);
        assert_eq!(cfg.database, PathBuf::from(".archdraft/archdraft.db"));
    }

    #[test]
    fn agent_config_carries_settings() {
        let settings = AgentSettings {
            retry_delay_ms: 10,
            max_attempts: 5,
            ..Default::default()
        };
        let agent = settings.to_agent_config(Some("k".into()));
        assert_eq!(agent.retry.max_attempts, 5);
        assert_eq!(agent.retry.retry_delay, Duration::from_millis(10));
        assert_eq!(agent.client.api_key.as_deref(), Some("k"));
        assert_eq!(agent.generation.max_output_tokens, 2048);
    }

    #[test]
    fn validate_flags_out_of_range_sampling() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_empty());
        cfg.agent.top_p = 1.5;
        cfg.agent.model = "gemini-2.5-flash".into();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }
}
