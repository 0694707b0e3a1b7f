//! Background work for the engine loop.
//!
//! Every suspension point of the engine (HTTP calls, deferred refreshes,
//! reveal ticks) runs in a spawned task that posts an [`EngineInput`] back to
//! the loop. The loop applies inputs one at a time, so engine state needs no
//! locks; the cost is that every completion must be validated for staleness
//! when it is applied.
//!
//! Each task races a child of the engine's root [`CancellationToken`].
//! Cancelling the root abandons all outstanding work without waiting for it.

use crate::sync::input::EngineInput;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Spawns cancellable work whose results flow back into the engine loop.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<EngineInput>,
    root: CancellationToken,
}

impl TaskSpawner {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EngineInput>, root: CancellationToken) -> Self {
        Self { tx, root }
    }

    /// Run `work` and post its output, unless the engine is torn down first.
    pub(crate) fn spawn<F>(&self, work: F)
    where
        F: Future<Output = EngineInput> + Send + 'static,
    {
        let tx = self.tx.clone();
        let token = self.root.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => trace!("Task abandoned on teardown"),
                input = work => {
                    let _ = tx.send(input);
                }
            }
        });
    }

    /// Post `input` after `delay`.
    pub(crate) fn spawn_after(&self, delay: Duration, input: EngineInput) {
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            input
        });
    }

    /// Post `make()` every `period` until the returned token is cancelled.
    ///
    /// The first tick fires one full period after the call.
    pub(crate) fn spawn_ticker<M>(&self, period: Duration, make: M) -> CancellationToken
    where
        M: Fn() -> EngineInput + Send + 'static,
    {
        let tx = self.tx.clone();
        let token = self.root.child_token();
        let guard = token.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(make()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        token
    }

    /// Whether teardown has started.
    pub fn is_cancelled(&self) -> bool {
        self.root.is_cancelled()
    }
}
