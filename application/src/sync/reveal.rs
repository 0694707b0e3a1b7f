//! Reveal animator
//!
//! Drives one [`RevealSequence`] per freshly arrived assistant message. Each
//! job owns a ticker task that posts [`EngineInput::RevealTick`] into the
//! engine loop; the loop pulls the next offset and applies it to the
//! timeline. Jobs end when the sequence is exhausted, when the message is no
//! longer in the timeline, or on [`cancel_all`](RevealAnimator::cancel_all).

use crate::config::EngineConfig;
use crate::sync::input::EngineInput;
use crate::sync::tasks::TaskSpawner;
use crate::sync::timeline::ActiveTimeline;
use parley_domain::{MessageId, RevealSequence, RevealState};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

struct RevealJob {
    sequence: RevealSequence,
    ticker: CancellationToken,
}

/// Schedules incremental disclosure of assistant messages
pub struct RevealAnimator {
    tick: Duration,
    chars_per_tick: usize,
    jobs: HashMap<MessageId, RevealJob>,
}

impl RevealAnimator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tick: config.reveal_tick,
            chars_per_tick: config.chars_per_tick,
            jobs: HashMap::new(),
        }
    }

    /// Begin revealing `content` for message `id`.
    pub fn start(&mut self, id: MessageId, content: &str, spawner: &TaskSpawner) {
        let sequence = RevealSequence::new(content, self.chars_per_tick);
        let ticker = spawner.spawn_ticker(self.tick, move || EngineInput::RevealTick(id));
        trace!(
            "Reveal of message {} started ({} steps)",
            id.0,
            sequence.total_steps()
        );
        if let Some(previous) = self.jobs.insert(id, RevealJob { sequence, ticker }) {
            previous.ticker.cancel();
        }
    }

    /// Advance message `id` by one step.
    ///
    /// Returns the newly visible chunk and the message's state, or `None` for
    /// a tick that no longer belongs to a live job.
    pub fn on_tick(
        &mut self,
        id: MessageId,
        timeline: &mut ActiveTimeline,
    ) -> Option<(String, RevealState)> {
        let job = self.jobs.get_mut(&id)?;
        let Some(end) = job.sequence.next() else {
            self.finish(id);
            return None;
        };
        let Some((chunk, state)) = timeline.reveal(id, end) else {
            // Message left the timeline (session switch).
            self.finish(id);
            return None;
        };
        if state == RevealState::Complete || job.sequence.is_finished() {
            self.finish(id);
        }
        Some((chunk, state))
    }

    pub fn is_revealing(&self, id: MessageId) -> bool {
        self.jobs.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.jobs.len()
    }

    /// Stop every running reveal. Messages keep whatever was visible.
    pub fn cancel_all(&mut self) {
        for (_, job) in self.jobs.drain() {
            job.ticker.cancel();
        }
    }

    fn finish(&mut self, id: MessageId) {
        if let Some(job) = self.jobs.remove(&id) {
            job.ticker.cancel();
            trace!("Reveal of message {} finished", id.0);
        }
    }
}

impl Drop for RevealAnimator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
