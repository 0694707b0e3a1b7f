//! Reconciliation engine
//!
//! Owns the authoritative `active_session_id` and coordinates the directory,
//! the timeline and the reveal animator against the chat transport.
//!
//! The engine is driven by a single loop ([`run`](ReconciliationEngine::run))
//! that applies one input at a time: user commands arriving through an
//! [`EngineHandle`], completions of background work, reveal ticks, and
//! transport events. Background results are checked against the state at the
//! moment they are applied, never against what was current when the work was
//! issued.

use crate::config::EngineConfig;
use crate::ports::auth::AuthStatus;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::history_api::{HistoryApi, HistoryError};
use crate::ports::transport::{ChatTransport, TransportEvent};
use crate::ports::ui_event::UiEvent;
use crate::sync::directory::{RefreshOutcome, RefreshTicket, SessionDirectory};
use crate::sync::error::EngineError;
use crate::sync::handle::EngineHandle;
use crate::sync::input::{Command, EngineInput};
use crate::sync::reveal::RevealAnimator;
use crate::sync::tasks::TaskSpawner;
use crate::sync::timeline::ActiveTimeline;
use parley_domain::util::preview;
use parley_domain::{IncomingFrame, OutgoingFrame, Session, SessionId, StoredMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Coordinator of the chat client state
pub struct ReconciliationEngine {
    /// `None` while the conversation is an unsaved draft.
    active_session_id: Option<SessionId>,
    directory: SessionDirectory,
    timeline: ActiveTimeline,
    animator: RevealAnimator,
    transport: Arc<dyn ChatTransport>,
    spawner: TaskSpawner,
    inputs_tx: mpsc::UnboundedSender<EngineInput>,
    inputs: mpsc::UnboundedReceiver<EngineInput>,
    root: CancellationToken,
    ui: mpsc::UnboundedSender<UiEvent>,
    conversation_logger: Arc<dyn ConversationLogger>,
    config: EngineConfig,
    identity: AuthStatus,
    stopped: bool,
}

impl ReconciliationEngine {
    /// Create an engine for the user described by `identity`.
    pub fn new(
        api: Arc<dyn HistoryApi>,
        transport: Arc<dyn ChatTransport>,
        identity: AuthStatus,
        ui: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        let (inputs_tx, inputs) = mpsc::unbounded_channel();
        let root = CancellationToken::new();
        let config = EngineConfig::default();
        Self {
            active_session_id: None,
            directory: SessionDirectory::new(Arc::clone(&api)),
            timeline: ActiveTimeline::new(api),
            animator: RevealAnimator::new(&config),
            transport,
            spawner: TaskSpawner::new(inputs_tx.clone(), root.clone()),
            inputs_tx,
            inputs,
            root,
            ui,
            conversation_logger: Arc::new(NoConversationLogger),
            config,
            identity,
            stopped: false,
        }
    }

    /// Set a conversation logger for structured event logging.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Override timing parameters.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.animator = RevealAnimator::new(&config);
        self.config = config;
        self
    }

    /// A cloneable handle for issuing commands to this engine.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.inputs_tx.clone())
    }

    // ==================== Accessors ====================

    pub fn active_session_id(&self) -> Option<&SessionId> {
        self.active_session_id.as_ref()
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    pub fn timeline(&self) -> &ActiveTimeline {
        &self.timeline
    }

    pub fn animator(&self) -> &RevealAnimator {
        &self.animator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    // ==================== Lifecycle ====================

    /// Greet the user and load the directory.
    ///
    /// Refuses to start for an unauthenticated identity.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if !self.identity.authenticated {
            return Err(EngineError::NotAuthenticated);
        }
        info!(
            "Engine started for {}",
            self.identity.username.as_deref().unwrap_or("<unknown>")
        );
        self.emit(UiEvent::Welcome {
            username: self.identity.username.clone(),
        });
        self.emit(UiEvent::ConnectionChanged(self.transport.state()));
        self.emit(UiEvent::ActiveSessionChanged(None));
        self.directory.refresh(&self.spawner);
        Ok(())
    }

    /// Drive the engine until shutdown.
    pub async fn run(mut self, mut transport_events: mpsc::UnboundedReceiver<TransportEvent>) {
        let mut transport_live = true;
        while !self.stopped {
            tokio::select! {
                input = self.inputs.recv() => match input {
                    Some(input) => self.apply(input),
                    None => break,
                },
                event = transport_events.recv(), if transport_live => match event {
                    Some(event) => self.on_transport_event(event),
                    None => {
                        debug!("Transport event stream ended");
                        transport_live = false;
                    }
                },
            }
        }
        debug!("Engine loop exited");
    }

    /// Cancel reveals, close the transport and abandon outstanding requests.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.animator.cancel_all();
        self.transport.close();
        self.root.cancel();
        info!("Engine stopped");
        self.emit(UiEvent::Stopped);
    }

    // ==================== Input dispatch ====================

    /// Apply one input to completion.
    pub fn apply(&mut self, input: EngineInput) {
        if self.stopped {
            return;
        }
        match input {
            EngineInput::Command(command) => {
                if let Err(e) = self.execute(command) {
                    debug!("Command rejected: {}", e);
                    // SendRejected carries its own event with the content.
                    if !matches!(e, EngineError::SendRejected(_)) {
                        self.emit(UiEvent::CommandError {
                            message: e.to_string(),
                        });
                    }
                }
            }
            EngineInput::HistoryLoaded { target, result } => self.on_history_loaded(target, result),
            EngineInput::DirectoryRefreshed { ticket, result } => {
                self.on_directory_refreshed(ticket, result)
            }
            EngineInput::RemoteMutationFinished { op, id, result } => match result {
                Ok(()) => debug!("Remote {} of session {} succeeded", op.as_str(), id),
                Err(e) => warn!(
                    "Remote {} of session {} failed, local change kept: {}",
                    op.as_str(),
                    id,
                    e
                ),
            },
            EngineInput::TitleRefreshDue => {
                debug!("Deferred title refresh due");
                self.directory.refresh(&self.spawner);
            }
            EngineInput::RevealTick(id) => {
                if let Some((chunk, state)) = self.animator.on_tick(id, &mut self.timeline) {
                    self.emit(UiEvent::RevealProgress { id, chunk, state });
                }
            }
        }
    }

    /// Apply one transport event.
    pub fn on_transport_event(&mut self, event: TransportEvent) {
        if self.stopped {
            return;
        }
        match event {
            TransportEvent::StateChanged(state) => {
                debug!("Connection is {}", state);
                self.emit(UiEvent::ConnectionChanged(state));
            }
            TransportEvent::Frame(IncomingFrame::Control { message }) => {
                warn!("Server error: {}", message);
                self.log_event(ConversationEvent::ServerError {
                    message: message.clone(),
                });
                self.emit(UiEvent::ServerError { message });
            }
            TransportEvent::Frame(IncomingFrame::Content {
                message,
                session_id,
            }) => self.receive(message, session_id),
        }
    }

    fn execute(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Send(content) => self.send_message(content),
            Command::Select(id) => {
                self.select_session(id);
                Ok(())
            }
            Command::NewDraft => {
                self.new_draft();
                Ok(())
            }
            Command::Rename { id, title } => {
                self.directory.rename(&id, &title, &self.spawner)?;
                self.log_event(ConversationEvent::SessionRenamed {
                    session_id: id.clone(),
                    title: title.trim().to_string(),
                });
                self.emit_directory();
                Ok(())
            }
            Command::Delete { id, confirmation } => {
                let removed = self.directory.delete(&id, &confirmation, &self.spawner)?;
                self.log_event(ConversationEvent::SessionDeleted {
                    session_id: id.clone(),
                    title: removed.title,
                });
                self.emit_directory();
                if self.active_session_id.as_ref() == Some(&id) {
                    self.new_draft();
                }
                Ok(())
            }
            Command::Refresh => {
                self.directory.refresh(&self.spawner);
                Ok(())
            }
            Command::Shutdown => {
                self.shutdown();
                Ok(())
            }
        }
    }

    // ==================== Send / receive ====================

    fn send_message(&mut self, content: String) -> Result<(), EngineError> {
        if content.trim().is_empty() {
            return Err(EngineError::EmptyMessage);
        }
        let state = self.transport.state();
        if !state.accepts_sends() {
            self.emit(UiEvent::SendRejected { content, state });
            return Err(EngineError::SendRejected(state));
        }

        let view = self.timeline.append_local(&content);
        self.emit(UiEvent::MessageAppended(view));

        let frame = OutgoingFrame::new(content.as_str(), self.active_session_id.clone());
        match self.transport.send(&frame) {
            Ok(()) => {
                self.log_event(ConversationEvent::MessageSent {
                    session_id: self.active_session_id.clone(),
                    content,
                });
            }
            Err(e) => {
                warn!("Send failed after local echo: {}", e);
                self.emit(UiEvent::SendFailed {
                    content,
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }

    fn receive(&mut self, message: String, session_id: Option<SessionId>) {
        if let Some(id) = session_id {
            self.reconcile_identity(id);
        }
        if message.is_empty() {
            debug!("Echo without content; nothing to append");
            return;
        }
        debug!("Echo received: {}", preview(&message, 60));
        self.log_event(ConversationEvent::MessageReceived {
            session_id: self.active_session_id.clone(),
            content: message.clone(),
        });
        let view = self
            .timeline
            .append_remote(&message, &mut self.animator, &self.spawner);
        self.emit(UiEvent::MessageAppended(view));
    }

    /// First echo carrying an identity while in draft claims the draft; any
    /// later, different identity is dropped.
    fn reconcile_identity(&mut self, id: SessionId) {
        match &self.active_session_id {
            None => {
                info!("Draft identified as session {}", id);
                self.log_event(ConversationEvent::IdentityAdopted {
                    session_id: id.clone(),
                });
                self.active_session_id = Some(id.clone());
                self.emit(UiEvent::ActiveSessionChanged(Some(id)));
                // Give the server time to generate a title.
                self.spawner
                    .spawn_after(self.config.title_refresh_delay, EngineInput::TitleRefreshDue);
            }
            Some(current) if *current != id => {
                debug!("Discarding identity {} (active is {})", id, current);
                self.log_event(ConversationEvent::IdentityDiscarded {
                    session_id: id,
                    active: current.clone(),
                });
            }
            Some(_) => {}
        }
    }

    // ==================== Session switching ====================

    fn select_session(&mut self, id: SessionId) {
        debug!("Selecting session {}", id);
        self.animator.cancel_all();
        self.active_session_id = Some(id.clone());
        self.timeline.load(&id, &self.spawner);
        self.log_event(ConversationEvent::SessionSelected {
            session_id: id.clone(),
        });
        self.emit(UiEvent::ActiveSessionChanged(Some(id.clone())));
        self.emit(UiEvent::TimelineReplaced {
            session_id: Some(id),
            messages: Vec::new(),
        });
    }

    fn new_draft(&mut self) {
        debug!("Starting a new draft");
        self.animator.cancel_all();
        self.active_session_id = None;
        self.timeline.reset();
        self.emit(UiEvent::ActiveSessionChanged(None));
        self.emit(UiEvent::TimelineReplaced {
            session_id: None,
            messages: Vec::new(),
        });
    }

    fn on_history_loaded(
        &mut self,
        target: SessionId,
        result: Result<Vec<StoredMessage>, HistoryError>,
    ) {
        if self.active_session_id.as_ref() != Some(&target) {
            debug!("Discarding history for {}: no longer active", target);
            return;
        }
        match result {
            Ok(stored) => {
                if self.timeline.apply_history(&target, stored) {
                    // Reveals started during the load belong to the replaced timeline.
                    self.animator.cancel_all();
                    debug!("Loaded {} messages for {}", self.timeline.len(), target);
                    self.emit(UiEvent::TimelineReplaced {
                        session_id: Some(target),
                        messages: self.timeline.views(),
                    });
                } else {
                    debug!("Discarding history for {}: load superseded", target);
                }
            }
            Err(e) => {
                if self.timeline.abandon_load(&target) {
                    warn!("History for {} unavailable: {}", target, e);
                    self.emit(UiEvent::HistoryUnavailable {
                        session_id: target,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn on_directory_refreshed(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Session>, HistoryError>,
    ) {
        let sessions = match result {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Directory refresh failed: {}", e);
                return;
            }
        };
        match self.directory.apply_refresh(ticket, sessions) {
            RefreshOutcome::Applied => self.emit_directory(),
            RefreshOutcome::Superseded => debug!("Discarding superseded directory refresh"),
            RefreshOutcome::Stale { reissue } => {
                debug!("Discarding directory refresh issued before a local edit");
                if reissue {
                    self.directory.refresh(&self.spawner);
                }
            }
        }
    }

    // ==================== Output ====================

    fn emit(&self, event: UiEvent) {
        let _ = self.ui.send(event);
    }

    fn emit_directory(&self) {
        self.emit(UiEvent::DirectoryUpdated(self.directory.sessions().to_vec()));
    }

    fn log_event(&self, event: ConversationEvent) {
        self.conversation_logger.log(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::transport::TransportError;
    use crate::sync::directory::DeleteConfirmation;
    use crate::sync::directory::tests::{MockHistoryApi, sid};
    use parley_domain::{ConnectionState, Origin, RevealState};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    // ==================== Test Mocks ====================

    struct MockTransport {
        state: Mutex<ConnectionState>,
        sent: Mutex<Vec<OutgoingFrame>>,
        closed: AtomicBool,
        fail_sends: AtomicBool,
    }

    impl MockTransport {
        fn open() -> Self {
            Self {
                state: Mutex::new(ConnectionState::Open),
                sent: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
                fail_sends: AtomicBool::new(false),
            }
        }

        fn set_state(&self, state: ConnectionState) {
            *self.state.lock().unwrap() = state;
        }

        fn sent(&self) -> Vec<OutgoingFrame> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ChatTransport for MockTransport {
        fn state(&self) -> ConnectionState {
            *self.state.lock().unwrap()
        }

        fn send(&self, frame: &OutgoingFrame) -> Result<(), TransportError> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            self.sent.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl RecordingLogger {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.kind());
        }
    }

    struct Harness {
        engine: ReconciliationEngine,
        api: Arc<MockHistoryApi>,
        transport: Arc<MockTransport>,
        logger: Arc<RecordingLogger>,
        ui: mpsc::UnboundedReceiver<UiEvent>,
    }

    impl Harness {
        fn new(api: MockHistoryApi) -> Self {
            let api = Arc::new(api);
            let transport = Arc::new(MockTransport::open());
            let logger = Arc::new(RecordingLogger::default());
            let (tx, ui) = mpsc::unbounded_channel();
            let mut engine = ReconciliationEngine::new(
                api.clone(),
                transport.clone(),
                AuthStatus::signed_in("alice"),
                tx,
            )
            .with_conversation_logger(logger.clone());
            engine.start().unwrap();
            Self {
                engine,
                api,
                transport,
                logger,
                ui,
            }
        }

        fn command(&mut self, command: Command) {
            self.engine.apply(EngineInput::Command(command));
        }

        fn echo(&mut self, message: &str, session_id: Option<&str>) {
            self.engine
                .on_transport_event(TransportEvent::Frame(IncomingFrame::Content {
                    message: message.to_string(),
                    session_id: session_id.map(sid),
                }));
        }

        /// Apply background completions for `duration` of (paused) time.
        async fn drive_for(&mut self, duration: Duration) {
            let deadline = Instant::now() + duration;
            while let Ok(Some(input)) =
                tokio::time::timeout_at(deadline, self.engine.inputs.recv()).await
            {
                self.engine.apply(input);
            }
        }

        fn ui_events(&mut self) -> Vec<UiEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.ui.try_recv() {
                events.push(event);
            }
            events
        }

        fn contents(&self) -> Vec<(Origin, String)> {
            self.engine
                .timeline()
                .messages()
                .iter()
                .map(|m| (m.origin(), m.content().to_string()))
                .collect()
        }
    }

    fn stored(content: &str, is_user: bool) -> StoredMessage {
        StoredMessage {
            content: content.to_string(),
            is_user,
            id: None,
            created_at: None,
        }
    }

    const SETTLE: Duration = Duration::from_secs(5);

    // ==================== Send / receive ====================

    #[tokio::test(start_paused = true)]
    async fn test_draft_send_and_identity_echo() {
        let mut h = Harness::new(MockHistoryApi::with_sessions(vec![Session::new(
            sid("s1"),
            "Greeting",
        )]));
        h.drive_for(SETTLE).await;
        assert_eq!(h.api.count("list"), 1);

        h.command(Command::Send("hello".to_string()));
        assert_eq!(
            h.transport.sent(),
            vec![OutgoingFrame::new("hello", None)]
        );
        assert_eq!(h.contents(), vec![(Origin::User, "hello".to_string())]);

        h.echo("hi", Some("s1"));
        assert_eq!(h.engine.active_session_id(), Some(&sid("s1")));
        assert_eq!(
            h.contents(),
            vec![
                (Origin::User, "hello".to_string()),
                (Origin::Assistant, "hi".to_string())
            ]
        );

        h.drive_for(SETTLE).await;
        assert_eq!(h.api.count("list"), 2, "deferred title refresh");
        let reply = &h.engine.timeline().messages()[1];
        assert_eq!(reply.reveal_state(), RevealState::Complete);
        assert_eq!(reply.visible(), "hi");
        assert_eq!(h.engine.directory().sessions()[0].title, "Greeting");
        assert_eq!(
            h.logger.events(),
            vec!["message_sent", "identity_adopted", "message_received"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_title_refresh_waits_for_delay() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.drive_for(SETTLE).await;
        h.echo("hi", Some("s1"));
        h.drive_for(Duration::from_millis(1500)).await;
        assert_eq!(h.api.count("list"), 1);
        h.drive_for(Duration::from_millis(1000)).await;
        assert_eq!(h.api.count("list"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_identity_echo_is_discarded() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.echo("first", Some("s1"));
        h.echo("second", Some("s9"));
        assert_eq!(h.engine.active_session_id(), Some(&sid("s1")));
        assert_eq!(h.engine.timeline().len(), 2);
        assert!(h.logger.events().contains(&"identity_discarded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subsequent_sends_carry_identity() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.command(Command::Send("one".to_string()));
        h.echo("ack", Some("s1"));
        h.command(Command::Send("two".to_string()));
        assert_eq!(
            h.transport.sent()[1],
            OutgoingFrame::new("two", Some(sid("s1")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_echo_adopts_identity_without_append() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.echo("", Some("s1"));
        assert_eq!(h.engine.active_session_id(), Some(&sid("s1")));
        assert!(h.engine.timeline().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_message_is_rejected() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.ui_events();
        h.command(Command::Send("   ".to_string()));
        assert!(h.transport.sent().is_empty());
        assert!(h.engine.timeline().is_empty());
        assert!(matches!(
            h.ui_events().as_slice(),
            [UiEvent::CommandError { .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_control_frame_is_informational() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.command(Command::Send("hello".to_string()));
        h.ui_events();
        h.engine
            .on_transport_event(TransportEvent::Frame(IncomingFrame::Control {
                message: "rate limited".to_string(),
            }));
        assert_eq!(
            h.ui_events(),
            vec![UiEvent::ServerError {
                message: "rate limited".to_string()
            }]
        );
        assert_eq!(h.engine.timeline().len(), 1);
        assert!(h.engine.active_session_id().is_none());
    }

    // ==================== Session switching ====================

    #[tokio::test(start_paused = true)]
    async fn test_select_session_loads_complete_history() {
        let api = MockHistoryApi::default();
        api.set_history(
            &sid("s2"),
            vec![stored("q", true), stored("a", false), stored("q2", true)],
        );
        let mut h = Harness::new(api);
        h.command(Command::Send("draft residue".to_string()));

        h.command(Command::Select(sid("s2")));
        assert!(h.engine.timeline().is_empty());
        h.drive_for(SETTLE).await;

        assert_eq!(h.engine.active_session_id(), Some(&sid("s2")));
        assert_eq!(
            h.contents(),
            vec![
                (Origin::User, "q".to_string()),
                (Origin::Assistant, "a".to_string()),
                (Origin::User, "q2".to_string())
            ]
        );
        assert!(
            h.engine
                .timeline()
                .messages()
                .iter()
                .all(|m| m.reveal_state() == RevealState::Complete)
        );
        assert_eq!(h.engine.animator().active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_for_abandoned_session_is_discarded() {
        let api = MockHistoryApi::default();
        api.set_history(&sid("s2"), vec![stored("old", true)]);
        api.set_history(&sid("s3"), vec![stored("new", true)]);
        let mut h = Harness::new(api);

        h.command(Command::Select(sid("s2")));
        h.command(Command::Select(sid("s3")));
        h.drive_for(SETTLE).await;
        assert_eq!(h.contents(), vec![(Origin::User, "new".to_string())]);

        h.command(Command::Select(sid("s2")));
        h.command(Command::NewDraft);
        h.drive_for(SETTLE).await;
        assert!(h.engine.timeline().is_empty());
        assert!(h.engine.active_session_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_history_is_reported() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.command(Command::Select(sid("gone")));
        h.drive_for(SETTLE).await;
        assert!(h.ui_events().iter().any(|e| matches!(
            e,
            UiEvent::HistoryUnavailable { session_id, .. } if *session_id == sid("gone")
        )));
        assert_eq!(h.engine.active_session_id(), Some(&sid("gone")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_cancels_running_reveal() {
        let api = MockHistoryApi::default();
        api.set_history(&sid("s2"), Vec::new());
        let mut h = Harness::new(api);
        h.echo("a fairly long reply that takes a while", Some("s1"));
        assert_eq!(h.engine.animator().active_count(), 1);

        h.command(Command::Select(sid("s2")));
        assert_eq!(h.engine.animator().active_count(), 0);
        h.drive_for(SETTLE).await;
        assert!(!h.ui_events().iter().any(|e| matches!(e, UiEvent::RevealProgress { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_replace_cancels_reveal_started_during_load() {
        let api = MockHistoryApi::default();
        api.set_history(&sid("s2"), vec![stored("q", true), stored("a", false)]);
        let mut h = Harness::new(api);

        h.command(Command::Select(sid("s2")));
        h.echo("a late reply that is still being revealed", Some("s2"));
        assert_eq!(h.engine.animator().active_count(), 1);

        loop {
            let input = h.engine.inputs.recv().await.unwrap();
            let loaded = matches!(input, EngineInput::HistoryLoaded { .. });
            h.engine.apply(input);
            if loaded {
                break;
            }
        }
        assert_eq!(h.engine.animator().active_count(), 0);
        assert_eq!(
            h.contents(),
            vec![
                (Origin::User, "q".to_string()),
                (Origin::Assistant, "a".to_string())
            ]
        );

        h.ui_events();
        h.drive_for(SETTLE).await;
        assert!(!h.ui_events().iter().any(|e| matches!(e, UiEvent::RevealProgress { .. })));
    }

    // ==================== Directory ====================

    #[tokio::test(start_paused = true)]
    async fn test_delete_active_session_starts_draft() {
        let api = MockHistoryApi::with_sessions(vec![
            Session::new(sid("s1"), "One"),
            Session::new(sid("s2"), "Two"),
        ]);
        api.set_history(&sid("s2"), vec![stored("x", true)]);
        let mut h = Harness::new(api);
        h.drive_for(SETTLE).await;
        h.command(Command::Select(sid("s2")));
        h.drive_for(SETTLE).await;
        assert_eq!(h.engine.timeline().len(), 1);

        h.command(Command::Delete {
            id: sid("s2"),
            confirmation: DeleteConfirmation::confirm(&sid("s2")),
        });
        assert!(h.engine.active_session_id().is_none());
        assert!(h.engine.timeline().is_empty());
        assert!(!h.engine.directory().contains(&sid("s2")));
        h.drive_for(SETTLE).await;
        assert_eq!(h.api.count("delete s2"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_other_session_keeps_active() {
        let api = MockHistoryApi::with_sessions(vec![
            Session::new(sid("s1"), "One"),
            Session::new(sid("s2"), "Two"),
        ]);
        let mut h = Harness::new(api);
        h.drive_for(SETTLE).await;
        h.echo("hi", Some("s1"));

        h.command(Command::Delete {
            id: sid("s2"),
            confirmation: DeleteConfirmation::confirm(&sid("s2")),
        });
        assert_eq!(h.engine.active_session_id(), Some(&sid("s1")));
        assert_eq!(h.engine.timeline().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_applies_immediately() {
        let api = MockHistoryApi::with_sessions(vec![Session::new(sid("s1"), "New Chat")]);
        let mut h = Harness::new(api);
        h.drive_for(SETTLE).await;

        h.command(Command::Rename {
            id: sid("s1"),
            title: "Trip planning".to_string(),
        });
        assert_eq!(
            h.engine.directory().get(&sid("s1")).unwrap().title,
            "Trip planning"
        );
        assert!(h.logger.events().contains(&"session_renamed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_in_flight_during_rename_is_reissued() {
        let api = MockHistoryApi::with_sessions(vec![Session::new(sid("s1"), "Old")]);
        let mut h = Harness::new(api);
        h.drive_for(SETTLE).await;

        h.command(Command::Refresh);
        h.command(Command::Rename {
            id: sid("s1"),
            title: "Mine".to_string(),
        });
        *h.api.sessions.lock().unwrap() = vec![Session::new(sid("s1"), "Mine")];
        h.drive_for(SETTLE).await;

        assert_eq!(h.api.count("list"), 3);
        assert_eq!(h.engine.directory().get(&sid("s1")).unwrap().title, "Mine");
    }

    // ==================== Connection ====================

    #[tokio::test(start_paused = true)]
    async fn test_send_while_offline_is_rejected_observably() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.command(Command::Send("before".to_string()));

        for state in [ConnectionState::Closed, ConnectionState::Connecting] {
            h.transport.set_state(state);
            h.engine
                .on_transport_event(TransportEvent::StateChanged(state));
        }
        h.ui_events();
        h.command(Command::Send("during".to_string()));

        assert_eq!(h.transport.sent().len(), 1);
        assert_eq!(h.contents(), vec![(Origin::User, "before".to_string())]);
        assert_eq!(
            h.ui_events(),
            vec![UiEvent::SendRejected {
                content: "during".to_string(),
                state: ConnectionState::Connecting
            }]
        );

        h.transport.set_state(ConnectionState::Open);
        h.engine
            .on_transport_event(TransportEvent::StateChanged(ConnectionState::Open));
        h.command(Command::Send("after".to_string()));
        assert_eq!(h.transport.sent().len(), 2);
        assert_eq!(h.engine.timeline().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_keeps_local_echo() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.transport.fail_sends.store(true, Ordering::SeqCst);
        h.ui_events();
        h.command(Command::Send("hello".to_string()));
        assert_eq!(h.engine.timeline().len(), 1);
        assert!(
            h.ui_events()
                .iter()
                .any(|e| matches!(e, UiEvent::SendFailed { .. }))
        );
    }

    // ==================== Lifecycle ====================

    #[tokio::test]
    async fn test_start_requires_authentication() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = ReconciliationEngine::new(
            Arc::new(MockHistoryApi::default()),
            Arc::new(MockTransport::open()),
            AuthStatus::anonymous(),
            tx,
        );
        assert_eq!(engine.start(), Err(EngineError::NotAuthenticated));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_tears_everything_down() {
        let mut h = Harness::new(MockHistoryApi::default());
        h.echo("still revealing", Some("s1"));
        h.command(Command::Shutdown);

        assert!(h.engine.is_stopped());
        assert!(h.transport.closed.load(Ordering::SeqCst));
        assert_eq!(h.engine.animator().active_count(), 0);
        assert!(h.ui_events().contains(&UiEvent::Stopped));

        h.drive_for(SETTLE).await;
        assert!(h.ui_events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_processes_handle_commands() {
        let api = Arc::new(MockHistoryApi::default());
        let transport = Arc::new(MockTransport::open());
        let (ui_tx, mut ui) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let mut engine = ReconciliationEngine::new(
            api,
            transport.clone(),
            AuthStatus::signed_in("alice"),
            ui_tx,
        );
        engine.start().unwrap();
        let handle = engine.handle();
        let task = tokio::spawn(engine.run(events));

        handle.send_message("hello").unwrap();
        events_tx
            .send(TransportEvent::Frame(IncomingFrame::Content {
                message: "hi".to_string(),
                session_id: Some(sid("s1")),
            }))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.shutdown().unwrap();
        task.await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = ui.try_recv() {
            events.push(event);
        }
        assert!(events.contains(&UiEvent::ActiveSessionChanged(Some(sid("s1")))));
        assert_eq!(events.last(), Some(&UiEvent::Stopped));
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(
            handle.send_message("too late"),
            Err(EngineError::EngineStopped)
        );
    }
}
