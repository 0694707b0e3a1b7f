//! Console formatter for engine events

use colored::Colorize;
use parley_application::MessageView;
use parley_domain::{ConnectionState, Origin, Session, SessionId};

/// Formats engine state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Banner shown once the engine has started.
    pub fn welcome(username: Option<&str>) -> String {
        let line = "=".repeat(60);
        let who = match username {
            Some(name) => format!("Signed in as {}", name.bold()),
            None => "Signed in".to_string(),
        };
        format!(
            "{}\n{:^60}\n{}\n{}\nType a message to chat, or /help for commands.\n",
            line.cyan(),
            "parley".bold(),
            line.cyan(),
            who
        )
    }

    pub fn help() -> String {
        let mut output = format!("\n{}\n", "Commands:".cyan().bold());
        for (usage, text) in [
            ("/new", "Start a new conversation"),
            ("/sessions, /ls", "List conversations"),
            ("/open <n|id>", "Open a conversation"),
            ("/rename <n|id> <title>", "Rename a conversation"),
            ("/delete <n|id>", "Delete a conversation (asks first)"),
            ("/refresh", "Reload the conversation list"),
            ("/status", "Show connection and active conversation"),
            ("/logout", "Log out and exit"),
            ("/help, /h, /?", "Show this help"),
            ("/quit, /exit, /q", "Exit"),
        ] {
            output.push_str(&format!("  {:<24} - {}\n", usage, text));
        }
        output
    }

    /// Numbered listing; the active conversation is marked with `*`.
    pub fn session_list(sessions: &[Session], active: Option<&SessionId>) -> String {
        if sessions.is_empty() {
            return format!("{}\n", "No conversations yet.".dimmed());
        }
        let mut output = String::new();
        for (i, session) in sessions.iter().enumerate() {
            let marker = if session.id.as_ref() == active && active.is_some() {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            let when = session
                .formatted_time
                .as_deref()
                .map(|t| format!("  {}", t.dimmed()))
                .unwrap_or_default();
            output.push_str(&format!(
                "{} {:>3}. {}{}\n",
                marker,
                i + 1,
                session.display_title(),
                when
            ));
        }
        output
    }

    pub fn connection(state: ConnectionState) -> String {
        let label = match state {
            ConnectionState::Open => state.label().green(),
            ConnectionState::Closed => state.label().red(),
            ConnectionState::Connecting | ConnectionState::Closing => state.label().yellow(),
        };
        format!("[{}]", label)
    }

    pub fn status(
        state: ConnectionState,
        active_title: Option<&str>,
        username: Option<&str>,
    ) -> String {
        let conversation = active_title.unwrap_or("New conversation (draft)");
        format!(
            "{} {}\n{} {}\n{} {}\n",
            "Connection:".cyan().bold(),
            Self::connection(state),
            "Conversation:".cyan().bold(),
            conversation,
            "User:".cyan().bold(),
            username.unwrap_or("-")
        )
    }

    /// Speaker label that starts a timeline line.
    pub fn speaker(origin: Origin) -> String {
        match origin {
            Origin::User => format!("{} ", "you>".blue().bold()),
            Origin::Assistant => format!("{} ", "assistant>".magenta().bold()),
        }
    }

    /// A whole message, using only its disclosed prefix.
    pub fn message(view: &MessageView) -> String {
        format!("{}{}", Self::speaker(view.origin), view.visible)
    }

    pub fn timeline_header(title: &str) -> String {
        format!("\n{}\n{}", title.cyan().bold(), "-".repeat(40))
    }

    pub fn notice(text: &str) -> String {
        format!("{} {}", "·".dimmed(), text.dimmed())
    }

    pub fn error(text: &str) -> String {
        format!("{} {}", "Error:".red().bold(), text)
    }

    pub fn server_error(text: &str) -> String {
        format!("{} {}", "Server:".red().bold(), text.red())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_domain::{MessageId, RevealState};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_session_list_numbers_and_marks_active() {
        plain();
        let mut first = Session::new(SessionId::new("7").unwrap(), "");
        first.formatted_time = Some("Oct 19, 09:12".to_string());
        let second = Session::new(SessionId::new("9").unwrap(), "Borrow checker");
        let active = SessionId::new("9").unwrap();

        let output = ConsoleFormatter::session_list(&[first, second], Some(&active));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "    1. Conversation 7  Oct 19, 09:12");
        assert_eq!(lines[1], "*   2. Borrow checker");
    }

    #[test]
    fn test_session_list_empty() {
        plain();
        assert_eq!(
            ConsoleFormatter::session_list(&[], None),
            "No conversations yet.\n"
        );
    }

    #[test]
    fn test_message_uses_visible_prefix() {
        plain();
        let view = MessageView {
            id: MessageId(4),
            origin: Origin::Assistant,
            visible: "Hel".to_string(),
            reveal_state: RevealState::InProgress,
        };
        assert_eq!(ConsoleFormatter::message(&view), "assistant> Hel");
    }

    #[test]
    fn test_status_for_draft() {
        plain();
        let output = ConsoleFormatter::status(ConnectionState::Closed, None, Some("alice"));
        assert!(output.contains("Connection: [Offline]"));
        assert!(output.contains("New conversation (draft)"));
        assert!(output.contains("User: alice"));
    }
}
