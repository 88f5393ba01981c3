//! Assistant profiles and the per-turn chaining policy.

use serde::{Deserialize, Serialize};

/// Placeholder in assistant prompts, replaced by the full name of the
/// current target translation language.
pub const LANG_PLACEHOLDER: &str = "{LANG}";

/// How one user input is turned into model calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPolicy {
    /// One call with the assistant's own prompt, replaying eligible history.
    #[default]
    Direct,
    /// One call with the translator prompt and no history; the resulting
    /// turn is tagged `Translation` and never replayed.
    Translate,
    /// Two sequential calls: translate the question first, then chat with
    /// the translated text.
    TranslateThenChat,
}

impl ChatPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Translate => "translate",
            Self::TranslateThenChat => "translate_then_chat",
        }
    }
}

/// One selectable assistant from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantProfile {
    pub name: String,
    /// Chaining policy; plain chat when omitted.
    #[serde(default)]
    pub mode: ChatPolicy,
    /// System prompt, possibly containing [`LANG_PLACEHOLDER`].
    pub prompt: String,
    #[serde(default)]
    pub description: String,
}

/// Substitute [`LANG_PLACEHOLDER`] with the target language's full name.
pub fn render_prompt(prompt: &str, target_lang_full: &str) -> String {
    prompt.replace(LANG_PLACEHOLDER, target_lang_full)
}
