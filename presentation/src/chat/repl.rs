//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::chat::command::{ReplCommand, SessionRef};
use crate::chat::input::spawn_line_reader;
use crate::output::console::ConsoleFormatter;
use parley_application::{DeleteConfirmation, EngineError, EngineHandle, UiEvent};
use parley_domain::{ConnectionState, MessageId, Origin, RevealState, Session, SessionId};
use std::io::{self, Write};
use tokio::sync::mpsc;

/// Why the REPL returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    /// `/quit`, end of input, or the engine stopped
    Quit,
    /// `/logout`: the caller should end the server session
    Logout,
}

/// Interactive chat REPL
///
/// Reads commands line by line and renders engine events as they arrive.
/// Assistant replies are printed incrementally from reveal events.
pub struct ChatRepl {
    handle: EngineHandle,
    events: mpsc::UnboundedReceiver<UiEvent>,
    view: ReplView,
    pending_delete: Option<SessionId>,
}

impl ChatRepl {
    pub fn new(handle: EngineHandle, events: mpsc::UnboundedReceiver<UiEvent>) -> Self {
        Self {
            handle,
            events,
            view: ReplView::default(),
            pending_delete: None,
        }
    }

    /// Run on the terminal through the line editor.
    pub async fn run(self) -> io::Result<ReplExit> {
        self.run_with(spawn_line_reader()).await
    }

    /// Run on any line source; a closed channel ends the session.
    pub async fn run_with(
        mut self,
        mut lines: mpsc::UnboundedReceiver<String>,
    ) -> io::Result<ReplExit> {
        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else {
                        return Ok(ReplExit::Quit);
                    };
                    let stopped = matches!(event, UiEvent::Stopped);
                    write_out(&self.view.render(&event))?;
                    if stopped {
                        return Ok(ReplExit::Quit);
                    }
                }
                line = lines.recv() => {
                    let Some(line) = line else {
                        return Ok(ReplExit::Quit);
                    };
                    if let Some(exit) = self.handle_line(line.trim())? {
                        return Ok(exit);
                    }
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> io::Result<Option<ReplExit>> {
        if let Some(id) = self.pending_delete.take() {
            if is_affirmative(line) {
                let confirmation = DeleteConfirmation::confirm(&id);
                self.report(self.handle.delete_session(id, confirmation))?;
            } else {
                write_out(&format!("{}\n", ConsoleFormatter::notice("Kept.")))?;
            }
            return Ok(None);
        }
        if line.is_empty() {
            return Ok(None);
        }

        match ReplCommand::parse(line) {
            ReplCommand::Send(text) => self.report(self.handle.send_message(text))?,
            ReplCommand::New => self.report(self.handle.new_draft())?,
            ReplCommand::Sessions => write_out(&ConsoleFormatter::session_list(
                &self.view.sessions,
                self.view.active.as_ref(),
            ))?,
            ReplCommand::Open(target) => {
                if let Some(id) = self.resolve(&target)? {
                    self.report(self.handle.select_session(id))?;
                }
            }
            ReplCommand::Rename(target, title) => {
                if let Some(id) = self.resolve(&target)? {
                    self.report(self.handle.rename_session(id, title))?;
                }
            }
            ReplCommand::Delete(target) => {
                if let Some(id) = self.resolve(&target)? {
                    let title = self.view.title_of(&id);
                    write_out(&format!("Delete \"{}\"? [y/N] ", title))?;
                    self.pending_delete = Some(id);
                }
            }
            ReplCommand::Refresh => self.report(self.handle.refresh_directory())?,
            ReplCommand::Status => {
                let title = self.view.active.as_ref().map(|id| self.view.title_of(id));
                write_out(&ConsoleFormatter::status(
                    self.view.connection,
                    title.as_deref(),
                    self.view.username.as_deref(),
                ))?
            }
            ReplCommand::Logout => return Ok(Some(ReplExit::Logout)),
            ReplCommand::Help => write_out(&ConsoleFormatter::help())?,
            ReplCommand::Quit => {
                write_out("Bye!\n")?;
                return Ok(Some(ReplExit::Quit));
            }
            ReplCommand::Usage(usage) => write_out(&format!("Usage: {}\n", usage))?,
            ReplCommand::Unknown(cmd) => write_out(&format!(
                "Unknown command: {}\nType /help for available commands\n",
                cmd
            ))?,
        }
        Ok(None)
    }

    fn resolve(&self, target: &SessionRef) -> io::Result<Option<SessionId>> {
        let id = target.resolve(&self.view.sessions);
        if id.is_none() {
            let shown = match target {
                SessionRef::Index(n) => n.to_string(),
                SessionRef::Id(raw) => raw.clone(),
            };
            write_out(&format!(
                "{}\n",
                ConsoleFormatter::error(&format!(
                    "no conversation '{}'; see /sessions",
                    shown
                ))
            ))?;
        }
        Ok(id)
    }

    fn report(&self, result: Result<(), EngineError>) -> io::Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => write_out(&format!("{}\n", ConsoleFormatter::error(&e.to_string()))),
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn write_out(text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

/// What the REPL knows about the engine, rebuilt from its events.
#[derive(Debug)]
struct ReplView {
    sessions: Vec<Session>,
    active: Option<SessionId>,
    connection: ConnectionState,
    username: Option<String>,
    /// Assistant message whose line is still being revealed.
    open_line: Option<MessageId>,
}

impl Default for ReplView {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            active: None,
            connection: ConnectionState::Closed,
            username: None,
            open_line: None,
        }
    }
}

impl ReplView {
    fn title_of(&self, id: &SessionId) -> String {
        self.sessions
            .iter()
            .find(|s| s.id.as_ref() == Some(id))
            .map(Session::display_title)
            .unwrap_or_else(|| format!("Conversation {}", id))
    }

    /// Text that ends any partially revealed line.
    fn close_line(&mut self) -> &'static str {
        if self.open_line.take().is_some() {
            "\n"
        } else {
            ""
        }
    }

    /// Update local state and return what to print.
    fn render(&mut self, event: &UiEvent) -> String {
        if let UiEvent::RevealProgress { id, chunk, state } = event {
            return self.render_reveal(*id, chunk, *state);
        }

        let mut out = self.close_line().to_string();
        match event {
            UiEvent::Welcome { username } => {
                self.username = username.clone();
                out.push_str(&ConsoleFormatter::welcome(username.as_deref()));
            }
            UiEvent::Stopped => {
                out.push_str(&format!("{}\n", ConsoleFormatter::notice("Disconnected.")));
            }
            UiEvent::ConnectionChanged(state) => {
                self.connection = *state;
                out.push_str(&format!("{}\n", ConsoleFormatter::connection(*state)));
            }
            UiEvent::DirectoryUpdated(sessions) => {
                self.sessions = sessions.clone();
            }
            UiEvent::ActiveSessionChanged(id) => {
                self.active = id.clone();
            }
            UiEvent::TimelineReplaced {
                session_id,
                messages,
            } => {
                let title = match session_id {
                    Some(id) => self.title_of(id),
                    None => "New conversation".to_string(),
                };
                out.push_str(&format!("{}\n", ConsoleFormatter::timeline_header(&title)));
                for message in messages {
                    out.push_str(&ConsoleFormatter::message(message));
                    out.push('\n');
                }
            }
            UiEvent::HistoryUnavailable { session_id, reason } => {
                out.push_str(&format!(
                    "{}\n",
                    ConsoleFormatter::error(&format!(
                        "could not load conversation {}: {}",
                        session_id, reason
                    ))
                ));
            }
            UiEvent::MessageAppended(view) => {
                // The user already sees what they typed.
                if view.origin == Origin::Assistant {
                    out.push_str(&ConsoleFormatter::message(view));
                    if view.reveal_state == RevealState::Complete {
                        out.push('\n');
                    } else {
                        self.open_line = Some(view.id);
                    }
                }
            }
            UiEvent::ServerError { message } => {
                out.push_str(&format!("{}\n", ConsoleFormatter::server_error(message)));
            }
            UiEvent::SendRejected { content, state } => {
                out.push_str(&format!(
                    "{}\n",
                    ConsoleFormatter::error(&format!(
                        "not sent, connection is {}: {}",
                        state.label(),
                        content
                    ))
                ));
            }
            UiEvent::SendFailed { content, reason } => {
                out.push_str(&format!(
                    "{}\n",
                    ConsoleFormatter::error(&format!("sending \"{}\" failed: {}", content, reason))
                ));
            }
            UiEvent::CommandError { message } => {
                out.push_str(&format!("{}\n", ConsoleFormatter::error(message)));
            }
            UiEvent::RevealProgress { .. } => {}
        }
        out
    }

    fn render_reveal(&mut self, id: MessageId, chunk: &str, state: RevealState) -> String {
        let mut out = String::new();
        if self.open_line != Some(id) {
            out.push_str(self.close_line());
            out.push_str(&ConsoleFormatter::speaker(Origin::Assistant));
            out.push_str("...");
        }
        out.push_str(chunk);
        if state == RevealState::Complete {
            out.push('\n');
            self.open_line = None;
        } else {
            self.open_line = Some(id);
        }
        out
    }
}
