//! YAML configuration loading and validation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assistant::{AssistantProfile, ChatPolicy};

/// Errors raised while loading or validating configuration.
///
/// Every variant is fatal at startup; the session cannot run on a broken
/// config or an unusable vault directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("vault directory {} does not exist", .0.display())]
    VaultDirMissing(PathBuf),
    #[error("vault path {} is not a directory", .0.display())]
    VaultDirNotADirectory(PathBuf),
}

/// Application configuration, deserialized from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Completion API key. Required, never logged.
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub use_proxy: bool,
    #[serde(default)]
    pub proxy_url: String,

    /// Sampling temperature, clamped to `[0.1, 1.0]` at load.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// History store capacity in turns.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Model active at startup.
    pub model: String,
    /// Raw context window fallback for models missing from
    /// `model_token_limits`.
    #[serde(default = "default_model_token_limit")]
    pub model_token_limit: usize,
    /// Fraction of the raw window usable for context (0.8 = 80%).
    #[serde(default = "default_model_token_throttle")]
    pub model_token_throttle: f64,
    /// Tokens reserved for the model's reply.
    #[serde(default = "default_model_response_max_token")]
    pub model_response_max_token: usize,
    /// Per-model raw context windows.
    #[serde(default)]
    pub model_token_limits: HashMap<String, usize>,
    /// Models selectable via the `models` command. Defaults to `[model]`.
    #[serde(default)]
    pub models: Vec<String>,

    /// Assistants selectable via the `assistants` command; the first one is
    /// active at startup.
    pub assistants: Vec<AssistantProfile>,
    /// Target translation languages (ISO-639-1); the first one is the
    /// startup default.
    pub langs: Vec<String>,
    /// Language code to `say` voice name, for the `speak` command.
    #[serde(default)]
    pub lang_vocal: HashMap<String, String>,

    /// Directory holding persisted sessions. Must exist.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,
    /// Also keep the generated summary turn in the persisted history arrays.
    #[serde(default)]
    pub keep_summary_in_history: bool,

    #[serde(default)]
    pub log_verbose: bool,
    #[serde(default)]
    pub need_confirm: bool,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_history() -> usize {
    20
}

fn default_model_token_limit() -> usize {
    4096
}

fn default_model_token_throttle() -> f64 {
    0.8
}

fn default_model_response_max_token() -> usize {
    1024
}

fn default_vault_dir() -> String {
    "~/Downloads".to_string()
}

impl Config {
    /// Load and validate configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Default config file location: `<config dir>/confab/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "confab")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn normalize(&mut self) {
        self.temperature = self.temperature.clamp(0.1, 1.0);
        if self.models.is_empty() {
            self.models = vec![self.model.clone()];
        } else if !self.models.iter().any(|m| *m == self.model) {
            self.models.insert(0, self.model.clone());
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key must not be empty".into()));
        }
        if self.max_history == 0 {
            return Err(ConfigError::Invalid("max_history must be positive".into()));
        }
        if !(self.model_token_throttle > 0.0 && self.model_token_throttle <= 1.0) {
            return Err(ConfigError::Invalid(
                "model_token_throttle must be in (0.0, 1.0]".into(),
            ));
        }
        if self.assistants.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one assistant must be configured".into(),
            ));
        }
        if self.langs.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one target language must be configured".into(),
            ));
        }
        let needs_translator = self
            .assistants
            .iter()
            .any(|a| a.mode == ChatPolicy::TranslateThenChat);
        if needs_translator && self.translator().is_none() {
            return Err(ConfigError::Invalid(
                "an assistant with mode `translate` is required when any uses `translate_then_chat`"
                    .into(),
            ));
        }
        if self.use_proxy && self.proxy_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "proxy_url must be set when use_proxy is enabled".into(),
            ));
        }
        Ok(())
    }

    /// First configured assistant with the `translate` policy; supplies the
    /// translator prompt for chained calls.
    pub fn translator(&self) -> Option<&AssistantProfile> {
        self.assistants
            .iter()
            .find(|a| a.mode == ChatPolicy::Translate)
    }

    /// Vault directory with a leading `~` expanded to the home directory.
    pub fn vault_dir(&self) -> PathBuf {
        expand_home(&self.vault_dir)
    }

    /// Ensure the vault directory exists and is a directory.
    pub fn check_vault_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = self.vault_dir();
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(ConfigError::VaultDirNotADirectory(dir)),
            Err(_) => Err(ConfigError::VaultDirMissing(dir)),
        }
    }

    /// Usable context budget for `model`: the throttled raw window minus
    /// the tokens reserved for the response.
    pub fn token_limit_for(&self, model: &str) -> usize {
        let raw = self
            .model_token_limits
            .get(model)
            .copied()
            .unwrap_or(self.model_token_limit);
        let throttled = (raw as f64 * self.model_token_throttle).floor() as usize;
        throttled.saturating_sub(self.model_response_max_token)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(dirs) = directories::UserDirs::new() {
            return dirs.home_dir().to_path_buf();
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::UserDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
