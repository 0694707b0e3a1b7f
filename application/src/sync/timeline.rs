//! Active timeline: the ordered messages of the conversation on screen.
//!
//! Appends happen in the order the engine loop processes their triggering
//! events and are never reordered. A session switch replaces the timeline
//! wholesale; history is never merged into what was there before.

use crate::ports::history_api::HistoryApi;
use crate::ports::ui_event::MessageView;
use crate::sync::input::EngineInput;
use crate::sync::reveal::RevealAnimator;
use crate::sync::tasks::TaskSpawner;
use parley_domain::{Message, MessageId, RevealState, SessionId, StoredMessage};
use std::sync::Arc;

/// Messages of the currently displayed conversation
pub struct ActiveTimeline {
    api: Arc<dyn HistoryApi>,
    messages: Vec<Message>,
    next_id: u64,
    /// Session whose history load is outstanding.
    awaiting: Option<SessionId>,
}

impl ActiveTimeline {
    pub fn new(api: Arc<dyn HistoryApi>) -> Self {
        Self {
            api,
            messages: Vec::new(),
            next_id: 1,
            awaiting: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Session whose history is still being fetched, if any.
    pub fn awaiting(&self) -> Option<&SessionId> {
        self.awaiting.as_ref()
    }

    pub fn views(&self) -> Vec<MessageView> {
        self.messages.iter().map(MessageView::from).collect()
    }

    /// Empty the timeline and forget any outstanding load.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.awaiting = None;
    }

    /// Reset, then fetch the full history of `id` in the background.
    pub fn load(&mut self, id: &SessionId, spawner: &TaskSpawner) {
        self.reset();
        self.awaiting = Some(id.clone());
        let api = Arc::clone(&self.api);
        let target = id.clone();
        spawner.spawn(async move {
            let result = api.fetch_messages(&target).await;
            EngineInput::HistoryLoaded { target, result }
        });
    }

    /// Replace the timeline with loaded history, if `target` is the load we
    /// are still waiting for. Every loaded message is fully revealed.
    ///
    /// Returns `false` (and changes nothing) for a load nobody awaits.
    pub fn apply_history(&mut self, target: &SessionId, stored: Vec<StoredMessage>) -> bool {
        if self.awaiting.as_ref() != Some(target) {
            return false;
        }
        self.awaiting = None;
        let mut messages = Vec::with_capacity(stored.len());
        for m in stored {
            let origin = m.origin();
            messages.push(Message::complete(self.allocate_id(), m.content, origin));
        }
        self.messages = messages;
        true
    }

    /// Give up on an outstanding load for `target`.
    pub fn abandon_load(&mut self, target: &SessionId) -> bool {
        if self.awaiting.as_ref() == Some(target) {
            self.awaiting = None;
            return true;
        }
        false
    }

    /// Append a user message, fully revealed.
    pub fn append_local(&mut self, content: &str) -> MessageView {
        let id = self.allocate_id();
        let message = Message::user(id, content);
        let view = MessageView::from(&message);
        self.messages.push(message);
        view
    }

    /// Append an assistant message as pending and hand it to the animator.
    pub fn append_remote(
        &mut self,
        content: &str,
        animator: &mut RevealAnimator,
        spawner: &TaskSpawner,
    ) -> MessageView {
        let id = self.allocate_id();
        let message = Message::assistant_pending(id, content);
        let view = MessageView::from(&message);
        self.messages.push(message);
        animator.start(id, content, spawner);
        view
    }

    /// Disclose message `id` up to byte offset `end`.
    ///
    /// Returns the newly visible text and the resulting state, or `None` if
    /// the message is no longer in this timeline.
    pub fn reveal(&mut self, id: MessageId, end: usize) -> Option<(String, RevealState)> {
        let message = self.messages.iter_mut().find(|m| m.id() == id)?;
        let before = message.visible().len();
        let state = match message.reveal_to(end) {
            Ok(state) => state,
            Err(_) => message.reveal_state(),
        };
        let chunk = message.visible()[before..].to_string();
        Some((chunk, state))
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }
}
