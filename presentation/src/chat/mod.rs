//! Interactive chat module
//!
//! Provides a line-oriented chat interface driven by engine events.

mod command;
mod input;
mod repl;

pub use command::{ReplCommand, SessionRef};
pub use input::{history_path, spawn_line_reader};
pub use repl::{ChatRepl, ReplExit};
