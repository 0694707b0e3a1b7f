//! Presentation layer for parley
//!
//! This crate contains the CLI definition, the console formatter for engine
//! events, and the line-oriented interactive chat.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand, ReplExit, SessionRef};
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
