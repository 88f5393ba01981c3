//! Session engine for the confab chat client.
//!
//! This crate owns everything a running conversation needs before bytes hit
//! the network:
//! - the conversation data model (turns, bounded FIFO history)
//! - token cost estimation under the model's tokenizer
//! - the token-budgeted context-window assembler
//! - session status, assistant policies, and the YAML configuration layer

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod assistant;
pub mod config;
pub mod context;
pub mod estimator;
pub mod history;
pub mod message;
pub mod status;
pub mod turn;

pub use assistant::{render_prompt, AssistantProfile, ChatPolicy, LANG_PLACEHOLDER};
pub use config::{Config, ConfigError};
pub use context::{assemble, ContextParams};
pub use estimator::TokenEstimator;
pub use history::HistoryStore;
pub use message::{Message, Role};
pub use status::{RateLimitSnapshot, SessionStatus};
pub use turn::{RedactedTurn, Turn, TurnKind, DATETIME_FORMAT};
