//! Prompt plumbing around dialoguer, plus the terminal stream sink.

use std::io::Write;

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect, Input};

use confab_openai::StreamSink;

/// Interactive prompts for the chat loop.
pub struct Console {
    theme: ColorfulTheme,
}

impl Console {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// The main chat prompt. `initial` pre-fills the line so a declined
    /// input can be edited instead of retyped.
    pub fn chat_input(&self, initial: Option<String>) -> Result<String> {
        let mut prompt = Input::<String>::with_theme(&self.theme)
            .with_prompt("Chat")
            .allow_empty(true);
        if let Some(text) = initial {
            prompt = prompt.with_initial_text(text);
        }
        Ok(prompt.interact_text()?)
    }

    /// Free-form secondary prompt, for temperature editing and the like.
    pub fn input(&self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?)
    }

    /// Yes/no double-check of an input line. Defaults to yes.
    pub fn confirm_input(&self, text: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(format!("Confirm your input: {text}"))
            .default(true)
            .interact()?)
    }

    /// Pick one item from a list; typing narrows it down.
    pub fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        Ok(FuzzySelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?)
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints answer chunks as they stream in, then terminates the line.
///
/// Flushes after every chunk; without that the partial answer sits in the
/// stdout buffer until a newline arrives.
pub struct TerminalSink;

impl StreamSink for TerminalSink {
    fn on_chunk(&mut self, delta: &str) {
        print!("{delta}");
        let _ = std::io::stdout().flush();
    }

    fn on_complete(&mut self) {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_sink_accepts_chunks() {
        let mut sink = TerminalSink;
        sink.on_chunk("partial ");
        sink.on_chunk("answer");
        sink.on_complete();
    }
}
