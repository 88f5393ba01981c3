//! confab: an interactive terminal client for chat completion APIs.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

mod commands;
mod io;
mod language;
mod logging;
mod session;
mod speech;
mod table;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use confab_core::Config;
use confab_openai::OpenAiClient;

use crate::session::ChatSession;

#[derive(Debug, Parser)]
#[command(name = "confab", version, about = "Chat with a completion API from the terminal")]
struct Cli {
    /// Path to the YAML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("cannot determine the default config path")?,
    };
    let config = Config::load(&config_path)?;

    let logs = logging::init(cli.verbose || config.log_verbose);
    info!(path = %config_path.display(), "configuration loaded");

    // Refuse to start without a place to save sessions.
    let vault_dir = config.check_vault_dir()?;
    info!(path = %vault_dir.display(), "vault directory ready");

    let client = OpenAiClient::new(&config)?;
    ChatSession::new(config, Box::new(client), logs).run().await
}
