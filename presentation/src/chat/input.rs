//! Line editing for the chat REPL
//!
//! rustyline blocks, so the editor lives on its own thread and hands lines to
//! the async side over a channel. The channel closes on EOF or a terminal
//! error.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const PROMPT: &str = "> ";

/// Where line history is kept across runs.
pub fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("parley").join("history.txt"))
}

/// Start the editor thread and return the receiving end of its lines.
///
/// A plain thread rather than `spawn_blocking`: the runtime would wait on a
/// read that never returns when the REPL exits for another reason.
pub fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("parley-readline".to_string())
        .spawn(move || read_lines(tx));
    if let Err(e) = spawned {
        // rx sees a closed channel and the REPL quits.
        warn!("Could not start line editor: {}", e);
    }
    rx
}

fn read_lines(tx: mpsc::UnboundedSender<String>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            return;
        }
    };

    let history = history_path();
    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = rl.add_history_entry(trimmed);
                    // Saved per entry: the thread is not joined on exit.
                    if let Some(path) = &history
                        && let Err(e) = rl.save_history(path)
                    {
                        debug!("Could not save history {}: {}", path.display(), e);
                    }
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_lives_under_data_dir() {
        let Some(path) = history_path() else {
            return;
        };
        assert!(path.ends_with("parley/history.txt"));
        assert!(path.starts_with(dirs::data_dir().unwrap()));
    }
}
