//! JSONL transcript writer for conversation events.
//!
//! Each [`ConversationEvent`] becomes one JSON object per line: its payload
//! fields plus `type` and an RFC 3339 `timestamp`. The file is opened in
//! append mode, so transcripts of successive runs accumulate.

use parley_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Conversation logger writing one JSON object per line.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open (or create) the transcript at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The event's fields plus `type` and `timestamp`.
fn record(event: &ConversationEvent, timestamp: String) -> Value {
    let mut map = event.payload();
    map.insert("type".to_string(), Value::from(event.kind()));
    map.insert("timestamp".to_string(), Value::from(timestamp));
    Value::Object(map)
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let Ok(line) = serde_json::to_string(&record(&event, timestamp)) else {
            return;
        };
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        // Flush every line: a transcript cut short by a crash is still valid JSONL.
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Could not write conversation log {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_domain::SessionId;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn selected(raw: &str) -> ConversationEvent {
        ConversationEvent::SessionSelected {
            session_id: SessionId::new(raw).unwrap(),
        }
    }

    #[test]
    fn test_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("chat.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();

        logger.log(ConversationEvent::MessageSent {
            session_id: None,
            content: "hello".to_string(),
        });
        logger.log(ConversationEvent::IdentityAdopted {
            session_id: SessionId::new("12").unwrap(),
        });

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "message_sent");
        assert_eq!(lines[0]["content"], "hello");
        assert!(lines[0]["session_id"].is_null());
        assert_eq!(lines[1]["type"], "identity_adopted");
        assert_eq!(lines[1]["session_id"], "12");
        assert!(lines[1]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        for raw in ["1", "2"] {
            let logger = JsonlConversationLogger::open(&path).unwrap();
            logger.log(selected(raw));
        }
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["session_id"], "2");
    }

    #[test]
    fn test_server_error_record() {
        let value = record(
            &ConversationEvent::ServerError {
                message: "AI unavailable".to_string(),
            },
            "2026-01-01T00:00:00.000Z".to_string(),
        );
        assert_eq!(value["type"], "server_error");
        assert_eq!(value["message"], "AI unavailable");
        assert_eq!(value["timestamp"], "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_open_fails_for_directory_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlConversationLogger::open(dir.path()).is_err());
    }
}
