//! Mutable session state, rendered by the `status` command.

use serde::{Deserialize, Serialize};

use crate::assistant::AssistantProfile;
use crate::config::Config;

/// Last known rate-limit headers from the completion API.
///
/// Every field starts as `"unknown"` and stays that way until a probe
/// populates it; headers the server omits remain `"unknown"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub model: String,
    pub date: String,
    pub limit_requests: String,
    pub limit_tokens: String,
    pub remaining_requests: String,
    pub remaining_tokens: String,
    pub reset_requests: String,
    pub reset_tokens: String,
}

impl Default for RateLimitSnapshot {
    fn default() -> Self {
        let unknown = || "unknown".to_string();
        Self {
            model: unknown(),
            date: unknown(),
            limit_requests: unknown(),
            limit_tokens: unknown(),
            remaining_requests: unknown(),
            remaining_tokens: unknown(),
            reset_requests: unknown(),
            reset_tokens: unknown(),
        }
    }
}

/// Current session settings.
///
/// Mutated only by explicit user commands; read by the context assembler
/// and by everything that issues calls.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub model: String,
    pub temperature: f64,
    pub assistant: AssistantProfile,
    /// Usable context budget for the current model, see
    /// [`Config::token_limit_for`].
    pub token_limit: usize,
    /// Target translation language code (from `config.langs`).
    pub target_lang: String,
    pub rate_limit: RateLimitSnapshot,
    pub log_verbose: bool,
    pub need_confirm: bool,
}

impl SessionStatus {
    /// Seed a fresh status from validated configuration: first assistant,
    /// first language, token limit computed for the startup model.
    pub fn from_config(config: &Config) -> Self {
        // Config validation guarantees non-empty assistants and langs.
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            assistant: config.assistants[0].clone(),
            token_limit: config.token_limit_for(&config.model),
            target_lang: config.langs[0].clone(),
            rate_limit: RateLimitSnapshot::default(),
            log_verbose: config.log_verbose,
            need_confirm: config.need_confirm,
        }
    }

    /// Switch the active model and recompute its token budget.
    pub fn set_model(&mut self, config: &Config, model: String) {
        self.token_limit = config.token_limit_for(&model);
        self.model = model;
    }
}
