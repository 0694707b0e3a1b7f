//! Session directory: the user's persisted conversations.
//!
//! The directory is eventually consistent with the server:
//!
//! - [`refresh`](SessionDirectory::refresh) replaces the whole list when the
//!   response arrives; it never merges.
//! - [`rename`](SessionDirectory::rename) and
//!   [`delete`](SessionDirectory::delete) apply locally first and then issue
//!   the remote call. A failed remote call is logged and **not** rolled back;
//!   the next successful refresh re-derives the truth.
//!
//! Local edits bump a revision counter. A refresh issued before the latest
//! local edit is stale on arrival and is dropped instead of overwriting the
//! edit; so is a refresh older than one already applied.

use crate::ports::history_api::HistoryApi;
use crate::sync::error::DirectoryError;
use crate::sync::input::{EngineInput, RemoteOp};
use crate::sync::tasks::TaskSpawner;
use parley_domain::{Session, SessionId};
use std::sync::Arc;
use tracing::debug;

/// Proof that the user confirmed deleting one specific session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    id: SessionId,
}

impl DeleteConfirmation {
    /// Build after the user has explicitly confirmed deleting `id`.
    pub fn confirm(id: &SessionId) -> Self {
        Self { id: id.clone() }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.id
    }
}

/// Identifies one in-flight refresh and the local revision it was issued at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
    revision: u64,
}

/// What happened to a refresh response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The list was replaced.
    Applied,
    /// A newer refresh was already applied.
    Superseded,
    /// A local edit happened after this refresh was issued.
    Stale { reissue: bool },
}

/// The user's conversation list
pub struct SessionDirectory {
    api: Arc<dyn HistoryApi>,
    sessions: Vec<Session>,
    revision: u64,
    issued: u64,
    applied: u64,
}

impl SessionDirectory {
    pub fn new(api: Arc<dyn HistoryApi>) -> Self {
        Self {
            api,
            sessions: Vec::new(),
            revision: 0,
            issued: 0,
            applied: 0,
        }
    }

    /// Sessions in server order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id.as_ref() == Some(id))
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.get(id).is_some()
    }

    /// Fetch the full list in the background.
    pub fn refresh(&mut self, spawner: &TaskSpawner) -> RefreshTicket {
        self.issued += 1;
        let ticket = RefreshTicket {
            seq: self.issued,
            revision: self.revision,
        };
        let api = Arc::clone(&self.api);
        spawner.spawn(async move {
            let result = api.list_sessions().await;
            EngineInput::DirectoryRefreshed { ticket, result }
        });
        debug!("Directory refresh #{} issued", ticket.seq);
        ticket
    }

    /// Replace the list with a refresh response, unless it is stale.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, sessions: Vec<Session>) -> RefreshOutcome {
        if ticket.seq <= self.applied {
            return RefreshOutcome::Superseded;
        }
        if ticket.revision != self.revision {
            return RefreshOutcome::Stale {
                reissue: ticket.seq == self.issued,
            };
        }
        self.sessions = sessions;
        self.applied = ticket.seq;
        RefreshOutcome::Applied
    }

    /// Retitle locally, then issue the remote rename.
    pub fn rename(
        &mut self,
        id: &SessionId,
        title: &str,
        spawner: &TaskSpawner,
    ) -> Result<(), DirectoryError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DirectoryError::EmptyTitle);
        }
        let entry = self
            .sessions
            .iter_mut()
            .find(|s| s.id.as_ref() == Some(id))
            .ok_or_else(|| DirectoryError::UnknownSession(id.clone()))?;
        entry.title = title.to_string();
        self.revision += 1;

        let api = Arc::clone(&self.api);
        let id = id.clone();
        let title = title.to_string();
        spawner.spawn(async move {
            let result = api.rename_session(&id, &title).await;
            EngineInput::RemoteMutationFinished {
                op: RemoteOp::Rename,
                id,
                result,
            }
        });
        Ok(())
    }

    /// Remove locally, then issue the remote delete.
    pub fn delete(
        &mut self,
        id: &SessionId,
        confirmation: &DeleteConfirmation,
        spawner: &TaskSpawner,
    ) -> Result<Session, DirectoryError> {
        if confirmation.session_id() != id {
            return Err(DirectoryError::ConfirmationMismatch {
                requested: id.clone(),
                confirmed: confirmation.session_id().clone(),
            });
        }
        let index = self
            .sessions
            .iter()
            .position(|s| s.id.as_ref() == Some(id))
            .ok_or_else(|| DirectoryError::UnknownSession(id.clone()))?;
        let removed = self.sessions.remove(index);
        self.revision += 1;

        let api = Arc::clone(&self.api);
        let id = id.clone();
        spawner.spawn(async move {
            let result = api.delete_session(&id).await;
            EngineInput::RemoteMutationFinished {
                op: RemoteOp::Delete,
                id,
                result,
            }
        });
        Ok(removed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::history_api::HistoryError;
    use async_trait::async_trait;
    use parley_domain::StoredMessage;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    // ==================== Test Mocks ====================

    /// In-memory history API recording every call.
    #[derive(Default)]
    pub(crate) struct MockHistoryApi {
        pub sessions: Mutex<Vec<Session>>,
        pub histories: Mutex<HashMap<SessionId, Vec<StoredMessage>>>,
        pub calls: Mutex<Vec<String>>,
        pub fail_mutations: bool,
    }

    impl MockHistoryApi {
        pub fn with_sessions(sessions: Vec<Session>) -> Self {
            Self {
                sessions: Mutex::new(sessions),
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_mutations: true,
                ..Default::default()
            }
        }

        pub fn set_history(&self, id: &SessionId, messages: Vec<StoredMessage>) {
            self.histories
                .lock()
                .unwrap()
                .insert(id.clone(), messages);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, prefix: &str) -> usize {
            self.calls().iter().filter(|c| c.starts_with(prefix)).count()
        }
    }

    #[async_trait]
    impl HistoryApi for MockHistoryApi {
        async fn list_sessions(&self) -> Result<Vec<Session>, HistoryError> {
            self.calls.lock().unwrap().push("list".to_string());
            Ok(self.sessions.lock().unwrap().clone())
        }

        async fn fetch_messages(
            &self,
            id: &SessionId,
        ) -> Result<Vec<StoredMessage>, HistoryError> {
            self.calls.lock().unwrap().push(format!("fetch {}", id));
            self.histories
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or(HistoryError::Http {
                    status: 404,
                    body: "not found".to_string(),
                })
        }

        async fn delete_session(&self, id: &SessionId) -> Result<(), HistoryError> {
            self.calls.lock().unwrap().push(format!("delete {}", id));
            if self.fail_mutations {
                return Err(HistoryError::Request("offline".to_string()));
            }
            Ok(())
        }

        async fn rename_session(&self, id: &SessionId, title: &str) -> Result<(), HistoryError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("rename {} {}", id, title));
            if self.fail_mutations {
                return Err(HistoryError::Request("offline".to_string()));
            }
            Ok(())
        }
    }

    pub(crate) fn sid(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    fn setup(
        api: MockHistoryApi,
    ) -> (
        SessionDirectory,
        Arc<MockHistoryApi>,
        TaskSpawner,
        mpsc::UnboundedReceiver<EngineInput>,
    ) {
        let api = Arc::new(api);
        let (tx, rx) = mpsc::unbounded_channel();
        let spawner = TaskSpawner::new(tx, CancellationToken::new());
        let dir = SessionDirectory::new(api.clone());
        (dir, api, spawner, rx)
    }

    async fn next_refresh(
        rx: &mut mpsc::UnboundedReceiver<EngineInput>,
    ) -> (RefreshTicket, Vec<Session>) {
        match rx.recv().await {
            Some(EngineInput::DirectoryRefreshed { ticket, result }) => (ticket, result.unwrap()),
            other => panic!("expected refresh, got {:?}", other),
        }
    }

    // ==================== Refresh ====================

    #[tokio::test]
    async fn test_refresh_replaces_list() {
        let (mut dir, _api, spawner, mut rx) = setup(MockHistoryApi::with_sessions(vec![
            Session::new(sid("1"), "One"),
            Session::new(sid("2"), "Two"),
        ]));
        dir.refresh(&spawner);
        let (ticket, sessions) = next_refresh(&mut rx).await;
        assert_eq!(dir.apply_refresh(ticket, sessions), RefreshOutcome::Applied);
        assert_eq!(dir.sessions().len(), 2);
        assert_eq!(dir.sessions()[0].title, "One");
    }

    #[tokio::test]
    async fn test_older_refresh_is_superseded() {
        let (mut dir, _api, spawner, _rx) = setup(MockHistoryApi::default());
        let first = dir.refresh(&spawner);
        let second = dir.refresh(&spawner);
        assert_eq!(
            dir.apply_refresh(second, vec![Session::new(sid("new"), "Newer")]),
            RefreshOutcome::Applied
        );
        assert_eq!(
            dir.apply_refresh(first, vec![Session::new(sid("old"), "Older")]),
            RefreshOutcome::Superseded
        );
        assert_eq!(dir.sessions()[0].title, "Newer");
    }

    #[tokio::test]
    async fn test_refresh_issued_before_rename_is_stale() {
        let (mut dir, _api, spawner, _rx) = setup(MockHistoryApi::default());
        let seed = dir.refresh(&spawner);
        dir.apply_refresh(seed, vec![Session::new(sid("1"), "Old title")]);

        let in_flight = dir.refresh(&spawner);
        dir.rename(&sid("1"), "Trip planning", &spawner).unwrap();
        let outcome = dir.apply_refresh(in_flight, vec![Session::new(sid("1"), "Old title")]);

        assert_eq!(outcome, RefreshOutcome::Stale { reissue: true });
        assert_eq!(dir.get(&sid("1")).unwrap().title, "Trip planning");
    }

    // ==================== Rename ====================

    #[tokio::test]
    async fn test_rename_is_immediate_then_remote() {
        let (mut dir, api, spawner, mut rx) = setup(MockHistoryApi::default());
        let seed = dir.refresh(&spawner);
        dir.apply_refresh(seed, vec![Session::new(sid("s1"), "New Chat")]);
        let _ = rx.recv().await;

        dir.rename(&sid("s1"), "Trip planning", &spawner).unwrap();
        assert_eq!(dir.get(&sid("s1")).unwrap().title, "Trip planning");

        match rx.recv().await {
            Some(EngineInput::RemoteMutationFinished { op, id, result }) => {
                assert_eq!(op, RemoteOp::Rename);
                assert_eq!(id, sid("s1"));
                assert!(result.is_ok());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(api.count("rename s1 Trip planning"), 1);
    }

    #[tokio::test]
    async fn test_rename_failure_is_not_rolled_back() {
        let (mut dir, _api, spawner, mut rx) = setup(MockHistoryApi::failing());
        let seed = dir.refresh(&spawner);
        dir.apply_refresh(seed, vec![Session::new(sid("s1"), "Before")]);
        let _ = rx.recv().await;

        dir.rename(&sid("s1"), "After", &spawner).unwrap();
        match rx.recv().await {
            Some(EngineInput::RemoteMutationFinished { result, .. }) => assert!(result.is_err()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(dir.get(&sid("s1")).unwrap().title, "After");
    }

    #[tokio::test]
    async fn test_rename_rejects_unknown_and_blank() {
        let (mut dir, api, spawner, _rx) = setup(MockHistoryApi::default());
        assert_eq!(
            dir.rename(&sid("nope"), "x", &spawner),
            Err(DirectoryError::UnknownSession(sid("nope")))
        );
        assert_eq!(
            dir.rename(&sid("nope"), "   ", &spawner),
            Err(DirectoryError::EmptyTitle)
        );
        tokio::task::yield_now().await;
        assert_eq!(api.count("rename"), 0);
    }

    // ==================== Delete ====================

    #[tokio::test]
    async fn test_delete_requires_matching_confirmation() {
        let (mut dir, api, spawner, _rx) = setup(MockHistoryApi::default());
        let seed = dir.refresh(&spawner);
        dir.apply_refresh(
            seed,
            vec![Session::new(sid("a"), "A"), Session::new(sid("b"), "B")],
        );

        let wrong = DeleteConfirmation::confirm(&sid("b"));
        let err = dir.delete(&sid("a"), &wrong, &spawner).unwrap_err();
        assert!(matches!(err, DirectoryError::ConfirmationMismatch { .. }));
        assert!(dir.contains(&sid("a")));
        tokio::task::yield_now().await;
        assert_eq!(api.count("delete"), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_locally_and_remotely() {
        let (mut dir, api, spawner, mut rx) = setup(MockHistoryApi::default());
        let seed = dir.refresh(&spawner);
        dir.apply_refresh(
            seed,
            vec![Session::new(sid("a"), "A"), Session::new(sid("b"), "B")],
        );
        let _ = rx.recv().await;

        let removed = dir
            .delete(&sid("a"), &DeleteConfirmation::confirm(&sid("a")), &spawner)
            .unwrap();
        assert_eq!(removed.title, "A");
        assert_eq!(dir.sessions().len(), 1);
        assert_eq!(dir.sessions()[0].id, Some(sid("b")));

        let _ = rx.recv().await;
        assert_eq!(api.count("delete a"), 1);
    }
}
