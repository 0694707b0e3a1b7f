//! Parsing of REPL input lines

use parley_domain::{Session, SessionId};

/// Reference to a listed conversation: its 1-based position in the last
/// listing, or a raw session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    Index(usize),
    Id(String),
}

impl SessionRef {
    fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => SessionRef::Index(n),
            _ => SessionRef::Id(raw.to_string()),
        }
    }

    /// Resolve against the current listing.
    ///
    /// A number inside `1..=sessions.len()` names a position; any other value
    /// is taken as an id, which must appear in the listing.
    pub fn resolve(&self, sessions: &[Session]) -> Option<SessionId> {
        let by_id = |raw: &str| {
            sessions
                .iter()
                .filter_map(|s| s.id.as_ref())
                .find(|id| id.as_str() == raw)
                .cloned()
        };
        match self {
            SessionRef::Index(n) => match n.checked_sub(1).and_then(|i| sessions.get(i)) {
                Some(session) => session.id.clone(),
                None => by_id(&n.to_string()),
            },
            SessionRef::Id(raw) => by_id(raw),
        }
    }
}

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text: send as a chat message
    Send(String),
    New,
    Sessions,
    Open(SessionRef),
    Rename(SessionRef, String),
    Delete(SessionRef),
    Refresh,
    Status,
    Logout,
    Help,
    Quit,
    /// Known command with missing arguments; carries the usage line
    Usage(&'static str),
    Unknown(String),
}

impl ReplCommand {
    /// Parse a trimmed, non-empty input line.
    pub fn parse(line: &str) -> Self {
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Send(line.to_string());
        };
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        match name {
            "new" | "n" => ReplCommand::New,
            "sessions" | "ls" => ReplCommand::Sessions,
            "open" | "o" => match first_word(args) {
                Some((target, _)) => ReplCommand::Open(SessionRef::parse(target)),
                None => ReplCommand::Usage("/open <n|id>"),
            },
            "rename" => match first_word(args) {
                Some((target, title)) if !title.is_empty() => {
                    ReplCommand::Rename(SessionRef::parse(target), title.to_string())
                }
                _ => ReplCommand::Usage("/rename <n|id> <title>"),
            },
            "delete" | "rm" => match first_word(args) {
                Some((target, _)) => ReplCommand::Delete(SessionRef::parse(target)),
                None => ReplCommand::Usage("/delete <n|id>"),
            },
            "refresh" => ReplCommand::Refresh,
            "status" => ReplCommand::Status,
            "logout" => ReplCommand::Logout,
            "help" | "h" | "?" => ReplCommand::Help,
            "quit" | "exit" | "q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

fn first_word(args: &str) -> Option<(&str, &str)> {
    if args.is_empty() {
        return None;
    }
    Some(match args.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (args, ""),
    })
}
