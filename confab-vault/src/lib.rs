//! Session persistence for confab.
//!
//! A save snapshots the history store into an immutable pair of JSON files
//! in the vault directory: a redacted "history" file for humans and a full
//! "detail" file carrying the raw API payloads. Each pair shares a
//! datetime/timestamp key derived from a single instant. Saving also asks
//! the model for a one-line summary so stored sessions can be told apart
//! when listed later.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod error;
pub mod summary;
pub mod vault;

pub use error::VaultError;
pub use vault::{SavedSession, SessionVault, VaultEntry, VaultRecord};
