//! Cloneable command handle for a running engine.

use crate::sync::directory::DeleteConfirmation;
use crate::sync::error::EngineError;
use crate::sync::input::{Command, EngineInput};
use parley_domain::SessionId;
use tokio::sync::mpsc;

/// Sends user commands into the engine loop.
///
/// Every method only enqueues; outcomes are reported as UI events. Once the
/// loop has exited, every method returns [`EngineError::EngineStopped`].
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineInput>,
}

impl EngineHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EngineInput>) -> Self {
        Self { tx }
    }

    pub fn send_message(&self, content: impl Into<String>) -> Result<(), EngineError> {
        self.submit(Command::Send(content.into()))
    }

    pub fn select_session(&self, id: SessionId) -> Result<(), EngineError> {
        self.submit(Command::Select(id))
    }

    pub fn new_draft(&self) -> Result<(), EngineError> {
        self.submit(Command::NewDraft)
    }

    pub fn rename_session(
        &self,
        id: SessionId,
        title: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.submit(Command::Rename {
            id,
            title: title.into(),
        })
    }

    /// Delete `id`. The confirmation must have been built for the same id.
    pub fn delete_session(
        &self,
        id: SessionId,
        confirmation: DeleteConfirmation,
    ) -> Result<(), EngineError> {
        self.submit(Command::Delete { id, confirmation })
    }

    pub fn refresh_directory(&self) -> Result<(), EngineError> {
        self.submit(Command::Refresh)
    }

    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.submit(Command::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn submit(&self, command: Command) -> Result<(), EngineError> {
        self.tx
            .send(EngineInput::Command(command))
            .map_err(|_| EngineError::EngineStopped)
    }
}
