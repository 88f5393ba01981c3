//! The interactive chat loop and its command handlers.
//!
//! [`ChatSession`] owns every mutable piece of a running session: settings,
//! the bounded history, the transport, and the vault. Free text goes through
//! the active assistant's policy; command words are dispatched here. Failed
//! API calls are reported and the loop keeps running; only terminal I/O
//! failures end the program.

use anyhow::Result;
use console::style;
use serde_json::Value;
use tracing::{debug, error, info};

use confab_core::{
    assemble, render_prompt, ChatPolicy, Config, ContextParams, HistoryStore, SessionStatus,
    TokenEstimator, Turn, TurnKind,
};
use confab_openai::{ApiError, ChatRequest, ChatTransport};
use confab_vault::{SessionVault, VaultEntry};

use crate::commands::{self, Command};
use crate::io::{Console, TerminalSink};
use crate::language;
use crate::logging::LogControl;
use crate::speech;
use crate::table;

pub struct ChatSession {
    config: Config,
    status: SessionStatus,
    history: HistoryStore,
    estimator: TokenEstimator,
    transport: Box<dyn ChatTransport>,
    vault: SessionVault,
    console: Console,
    logs: LogControl,
}

impl ChatSession {
    pub fn new(config: Config, transport: Box<dyn ChatTransport>, logs: LogControl) -> Self {
        let status = SessionStatus::from_config(&config);
        let history = HistoryStore::new(config.max_history);
        let vault = SessionVault::new(config.vault_dir());
        Self {
            config,
            status,
            history,
            estimator: TokenEstimator::new(),
            transport,
            vault,
            console: Console::default(),
            logs,
        }
    }

    /// Prompt, dispatch, repeat until `exit`.
    pub async fn run(&mut self) -> Result<()> {
        info!(model = %self.status.model, assistant = %self.status.assistant.name, "session started");
        println!("{}", commands::help_text());

        // Holds the declined input so the next prompt starts pre-filled.
        let mut carry: Option<String> = None;
        loop {
            let input = self.console.chat_input(carry.take())?;
            let input = input.trim().to_string();
            if input.is_empty() {
                continue;
            }
            match Command::parse(&input) {
                Some(Command::Exit) => break,
                Some(Command::Cmd) => match self.pick_command()? {
                    Command::Exit => break,
                    command => self.dispatch(command).await?,
                },
                Some(command) => self.dispatch(command).await?,
                None => carry = self.chat(&input).await?,
            }
        }
        println!("Bye.");
        Ok(())
    }

    fn pick_command(&self) -> Result<Command> {
        let labels: Vec<String> = commands::ALL
            .iter()
            .map(|command| format!("{} ({})", command.as_str(), command.description()))
            .collect();
        let picked = self.console.select("Command", &labels)?;
        Ok(commands::ALL[picked])
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => println!("{}", commands::help_text()),
            // Both are handled in the loop before dispatch.
            Command::Cmd | Command::Exit => {}
            Command::Assistants => self.cmd_assistants()?,
            Command::Langs => self.cmd_langs()?,
            Command::Models => self.cmd_models()?,
            Command::Speak => self.cmd_speak().await,
            Command::History => self.cmd_history(),
            Command::Session => self.cmd_session()?,
            Command::HistoryList => self.cmd_history_list()?,
            Command::HistoryLoad => self.cmd_history_load()?,
            Command::Reset => self.cmd_reset(),
            Command::Save => self.cmd_save().await,
            Command::Status => self.cmd_status()?,
            Command::Log => self.cmd_log()?,
            Command::Temperature => self.cmd_temperature()?,
            Command::Limit => self.cmd_limit().await,
            Command::Confirm => self.cmd_confirm()?,
        }
        Ok(())
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Handle one free-text input. Returns the input itself when the user
    /// declined a confirmation, so the caller can pre-fill the next prompt.
    async fn chat(&mut self, input: &str) -> Result<Option<String>> {
        // A lone word in a spaced language is usually a mistyped command.
        if needs_short_input_confirm(input) && !self.console.confirm_input(input)? {
            return Ok(Some(input.to_string()));
        }
        if self.status.need_confirm && !self.console.confirm_input(input)? {
            return Ok(Some(input.to_string()));
        }

        let outcome = match self.status.assistant.mode {
            ChatPolicy::Direct => self
                .chat_text(input, None, true, TurnKind::Chat)
                .await
                .map(|_| ()),
            ChatPolicy::Translate => {
                let prompt = self.status.assistant.prompt.clone();
                self.chat_translation(input, &prompt).await.map(|_| ())
            }
            ChatPolicy::TranslateThenChat => self.chat_translated(input).await,
        };
        if let Err(err) = outcome {
            error!(error = %err, "chat request failed");
            println!("{}", style(format!("Request failed: {err}")).red());
        }
        Ok(None)
    }

    /// One completion call: assemble the context, stream the answer to the
    /// terminal, record the turn.
    async fn chat_text(
        &mut self,
        question: &str,
        system_prompt: Option<String>,
        include_history: bool,
        kind: TurnKind,
    ) -> Result<Turn, ApiError> {
        let system_prompt = system_prompt.unwrap_or_else(|| self.render_active_prompt());
        let messages = assemble(
            &self.estimator,
            &self.history,
            &ContextParams {
                question,
                system_prompt: &system_prompt,
                include_history,
                token_limit: self.status.token_limit,
                model: &self.status.model,
            },
        );
        let request = ChatRequest {
            model: self.status.model.clone(),
            messages,
            temperature: self.status.temperature,
            stream: true,
            max_tokens: None,
        };
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending completion request"
        );

        let mut sink = TerminalSink;
        let completion = self.transport.stream_chat(&request, &mut sink).await?;

        let turn = Turn::new(
            question,
            completion.content.clone(),
            kind,
            serde_json::to_value(&request).unwrap_or(Value::Null),
            serde_json::to_value(&completion).unwrap_or(Value::Null),
        );
        self.history.append(turn.clone());
        Ok(turn)
    }

    /// A translation call: rendered prompt, no history replay.
    async fn chat_translation(&mut self, question: &str, prompt: &str) -> Result<Turn, ApiError> {
        let system = render_prompt(prompt, language::full_name(&self.status.target_lang));
        self.chat_text(question, Some(system), false, TurnKind::Translation)
            .await
    }

    /// Translate the input first, then chat with the translated text.
    async fn chat_translated(&mut self, input: &str) -> Result<(), ApiError> {
        let Some(translator) = self.config.translator() else {
            error!("no translate-mode assistant configured");
            println!(
                "{}",
                style("No translator assistant is configured; add one with mode: translate.")
                    .red()
            );
            return Ok(());
        };
        let prompt = translator.prompt.clone();
        let translated = self.chat_translation(input, &prompt).await?;
        self.chat_text(&translated.answer, None, true, TurnKind::Chat)
            .await?;
        Ok(())
    }

    fn render_active_prompt(&self) -> String {
        render_prompt(
            &self.status.assistant.prompt,
            language::full_name(&self.status.target_lang),
        )
    }

    // =========================================================================
    // Settings commands
    // =========================================================================

    fn cmd_models(&mut self) -> Result<()> {
        let picked = self.console.select("Model", &self.config.models)?;
        let model = self.config.models[picked].clone();
        self.status.set_model(&self.config, model);
        println!(
            "Model set to {} (context budget {} tokens).",
            self.status.model, self.status.token_limit
        );
        Ok(())
    }

    fn cmd_assistants(&mut self) -> Result<()> {
        let labels: Vec<String> = self
            .config
            .assistants
            .iter()
            .map(|profile| format!("{} ({})", profile.name, profile.description))
            .collect();
        let picked = self.console.select("Assistant", &labels)?;
        self.status.assistant = self.config.assistants[picked].clone();
        println!("Assistant set to {}.", self.status.assistant.name);
        Ok(())
    }

    fn cmd_langs(&mut self) -> Result<()> {
        let picked = self.console.select("Target language", &self.config.langs)?;
        self.status.target_lang = self.config.langs[picked].clone();
        println!(
            "Target language set to {}.",
            language::full_name(&self.status.target_lang)
        );
        Ok(())
    }

    fn cmd_log(&mut self) -> Result<()> {
        let choices = vec![
            "silent (info level)".to_string(),
            "verbose (debug level)".to_string(),
        ];
        let picked = self.console.select("Log level", &choices)?;
        self.status.log_verbose = picked == 1;
        self.logs.set_verbose(self.status.log_verbose);
        info!(verbose = self.status.log_verbose, "log verbosity changed");
        Ok(())
    }

    fn cmd_temperature(&mut self) -> Result<()> {
        let raw = self.console.input("Temperature [0.1 - 1.0]")?;
        match parse_temperature(&raw) {
            Some(value) => {
                self.status.temperature = value;
                println!("Temperature set to {value}.");
            }
            None => debug!(input = %raw, "temperature left unchanged"),
        }
        Ok(())
    }

    fn cmd_confirm(&mut self) -> Result<()> {
        let choices = vec![
            "need (confirm every input)".to_string(),
            "noneed (send immediately)".to_string(),
        ];
        let picked = self.console.select("Input confirmation", &choices)?;
        self.status.need_confirm = picked == 0;
        println!(
            "Input confirmation {}.",
            if self.status.need_confirm { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    fn cmd_status(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(&self.status)?);
        Ok(())
    }

    async fn cmd_limit(&mut self) {
        println!("Probing rate limits for {}...", self.status.model);
        match self.transport.fetch_rate_limit(&self.status.model).await {
            Ok(snapshot) => {
                self.status.rate_limit = snapshot;
                match serde_json::to_string_pretty(&self.status.rate_limit) {
                    Ok(text) => println!("{text}"),
                    Err(err) => error!(error = %err, "cannot render rate limit snapshot"),
                }
            }
            Err(err) => {
                error!(error = %err, "rate limit probe failed");
                println!("{}", style(format!("Cannot fetch rate limits: {err}")).red());
            }
        }
    }

    // =========================================================================
    // History and vault commands
    // =========================================================================

    async fn cmd_speak(&self) {
        match self.history.fetch_last() {
            Some(turn) => {
                if let Err(err) = speech::speak(&turn.answer, &self.config.lang_vocal).await {
                    error!(error = %err, "speech playback failed");
                    println!("{}", style(format!("Cannot speak the answer: {err}")).red());
                }
            }
            None => println!("No answer to speak yet."),
        }
    }

    fn cmd_history(&self) {
        let turns = self.history.fetch_redacted();
        if turns.is_empty() {
            println!("No history in this session yet.");
            return;
        }
        for turn in &turns {
            println!(
                "{}",
                style(format!("[{}][{}]", turn.datetime, turn.kind.as_str())).dim()
            );
            println!("{} {}", style("Q:").cyan().bold(), turn.question);
            println!("{} {}", style("A:").green().bold(), turn.answer);
        }
    }

    fn cmd_session(&self) -> Result<()> {
        let turns = self.history.fetch_all();
        if turns.is_empty() {
            println!("No history in this session yet.");
            return Ok(());
        }
        println!("{}", serde_json::to_string_pretty(&turns)?);
        Ok(())
    }

    fn cmd_reset(&mut self) {
        self.history.clear();
        println!("Session history cleared.");
    }

    async fn cmd_save(&mut self) {
        let saved = self
            .vault
            .save(
                &mut self.history,
                self.transport.as_ref(),
                &self.status.model,
                self.status.temperature,
                self.config.keep_summary_in_history,
            )
            .await;
        match saved {
            Ok(saved) => {
                println!("{}", style(format!("Saved {}", saved.history_path.display())).green());
                println!("{}", style(format!("Saved {}", saved.detail_path.display())).green());
                println!("Summary: {}", saved.summary);
            }
            Err(err) => {
                error!(error = %err, "saving session failed");
                println!("{}", style(format!("Cannot save the session: {err}")).red());
            }
        }
    }

    fn cmd_history_list(&self) -> Result<()> {
        let entries = self.sorted_entries()?;
        if entries.is_empty() {
            println!("The vault is empty.");
            return Ok(());
        }
        print!("{}", table::render(&entries));
        Ok(())
    }

    fn cmd_history_load(&mut self) -> Result<()> {
        if self.history.has_history() {
            println!("Current session already has history; save or reset it before loading.");
            return Ok(());
        }
        let entries = self.sorted_entries()?;
        if entries.is_empty() {
            println!("The vault is empty.");
            return Ok(());
        }
        let labels: Vec<String> = entries.iter().map(table::entry_label).collect();
        let picked = self.console.select("Stored session", &labels)?;
        match self.vault.load_into(&entries[picked], &mut self.history) {
            Ok(count) => println!(
                "Restored {count} turns from {}.",
                entries[picked].path.display()
            ),
            Err(err) => {
                error!(error = %err, "loading stored session failed");
                println!(
                    "{}",
                    style(format!("Cannot load the stored session: {err}")).red()
                );
            }
        }
        Ok(())
    }

    /// Stored sessions, newest first.
    fn sorted_entries(&self) -> Result<Vec<VaultEntry>> {
        let mut entries = self.vault.list()?;
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.timestamp));
        Ok(entries)
    }
}

/// A single word in a spaced-out language is more often a typo than a
/// question, so it gets an extra confirmation. Scripts without spaces
/// (and Arabic, where one word can be a full sentence) are exempt.
fn needs_short_input_confirm(input: &str) -> bool {
    !matches!(language::detect(input), "ja" | "zh" | "ko" | "ar")
        && language::count_words(input) == 1
}

/// Parse a temperature; out-of-range or unparseable input means no change.
fn parse_temperature(input: &str) -> Option<f64> {
    let value: f64 = input.trim().parse().ok()?;
    (0.1..=1.0).contains(&value).then_some(value)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use confab_core::{RateLimitSnapshot, Role};
    use confab_openai::{Completion, StreamSink};

    use crate::logging;

    #[derive(Clone)]
    struct CapturingTransport {
        reply: &'static str,
        seen: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl CapturingTransport {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for CapturingTransport {
        async fn stream_chat(
            &self,
            request: &ChatRequest,
            sink: &mut dyn StreamSink,
        ) -> Result<Completion, ApiError> {
            self.seen.lock().unwrap().push(request.clone());
            sink.on_chunk(self.reply);
            sink.on_complete();
            Ok(Completion {
                content: self.reply.to_string(),
                ..Completion::default()
            })
        }

        async fn fetch_rate_limit(&self, model: &str) -> Result<RateLimitSnapshot, ApiError> {
            Ok(RateLimitSnapshot {
                model: model.to_string(),
                ..RateLimitSnapshot::default()
            })
        }
    }

    fn sample_config(dir: &TempDir) -> Config {
        let yaml = format!(
            concat!(
                "api_key: test-key\n",
                "base_url: http://localhost:0\n",
                "model: gpt-4o-mini\n",
                "vault_dir: {}\n",
                "assistants:\n",
                "  - name: chat\n",
                "    prompt: You are a concise assistant.\n",
                "  - name: translator\n",
                "    mode: translate\n",
                "    prompt: Translate into {{LANG}}. Reply with only the translation.\n",
                "langs:\n",
                "  - en\n",
                "  - ja\n",
            ),
            dir.path().display()
        );
        Config::from_yaml(&yaml).unwrap()
    }

    fn session_with(
        dir: &TempDir,
        transport: CapturingTransport,
    ) -> (ChatSession, Arc<Mutex<Vec<ChatRequest>>>) {
        let seen = transport.seen.clone();
        let session = ChatSession::new(
            sample_config(dir),
            Box::new(transport),
            logging::init(false),
        );
        (session, seen)
    }

    #[tokio::test]
    async fn test_chat_text_appends_turn() {
        let dir = TempDir::new().unwrap();
        let (mut session, seen) = session_with(&dir, CapturingTransport::new("Hello there."));

        let turn = session
            .chat_text("hi", None, true, TurnKind::Chat)
            .await
            .unwrap();

        assert_eq!(turn.answer, "Hello there.");
        assert_eq!(turn.kind, TurnKind::Chat);
        assert_eq!(session.history.len(), 1);

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].stream);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages.last().unwrap().content, "hi");
    }

    #[tokio::test]
    async fn test_chat_translated_chains_two_calls() {
        let dir = TempDir::new().unwrap();
        let (mut session, seen) = session_with(&dir, CapturingTransport::new("Good morning."));

        session.chat_translated("Guten Morgen").await.unwrap();

        let turns = session.history.fetch_all();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].kind, TurnKind::Translation);
        assert_eq!(turns[1].kind, TurnKind::Chat);

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 2);
        // Translation call: rendered prompt, no replayed history.
        assert!(requests[0].messages[0].content.contains("English"));
        assert_eq!(requests[0].messages.len(), 2);
        // Chat call asks the translated text; the translation turn itself
        // is never replayed, so the message list is again just two long.
        assert_eq!(requests[1].messages.last().unwrap().content, "Good morning.");
        assert_eq!(requests[1].messages.len(), 2);
    }

    #[test]
    fn test_parse_temperature() {
        assert_eq!(parse_temperature("0.5"), Some(0.5));
        assert_eq!(parse_temperature(" 0.3 "), Some(0.3));
        assert_eq!(parse_temperature("1.0"), Some(1.0));
        assert_eq!(parse_temperature("1.2"), None);
        assert_eq!(parse_temperature("0.05"), None);
        assert_eq!(parse_temperature("abc"), None);
        assert_eq!(parse_temperature(""), None);
    }

    #[test]
    fn test_needs_short_input_confirm() {
        assert!(needs_short_input_confirm("hello"));
        assert!(!needs_short_input_confirm("hello there"));
        assert!(!needs_short_input_confirm("こんにちは"));
    }
}
