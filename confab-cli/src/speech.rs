//! Answer read-out through the macOS `say` command.
//!
//! Run `say -v "?"` to list installed voices. Configuration maps ISO 639-1
//! codes to voice names, for example `ja: Kyoko`.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::language;

/// Speak `text` with the voice configured for its detected language.
pub async fn speak(text: &str, lang_vocal: &HashMap<String, String>) -> Result<()> {
    let mut command = Command::new("say");
    if let Some(voice) = voice_for(text, lang_vocal) {
        command.arg("-v").arg(voice);
    }
    command.arg(text);

    let status = command
        .status()
        .await
        .context("cannot run the say command")?;
    if !status.success() {
        bail!("say exited with {status}");
    }
    Ok(())
}

/// Voice matching the detected language, falling back to the "en" entry.
fn voice_for<'a>(text: &str, lang_vocal: &'a HashMap<String, String>) -> Option<&'a String> {
    let lang = language::detect(text);
    if let Some(voice) = lang_vocal.get(lang) {
        return Some(voice);
    }
    debug!(lang, "no voice configured for detected language, falling back to en");
    lang_vocal.get("en")
}
