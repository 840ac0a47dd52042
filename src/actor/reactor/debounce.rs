use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use super::{Event, Sender};

/// Coalesces bursts of focus notifications into one re-evaluation.
///
/// Arming the timer replaces whatever was pending. Each arm gets a new
/// generation number and the timer reports back with it, so a firing that
/// raced with a re-arm is recognised as stale and ignored.
#[derive(Debug, Default)]
pub struct FocusDebounce {
    generation: u64,
    pending: Option<u64>,
    task: Option<JoinHandle<()>>,
}

impl FocusDebounce {
    /// Arms the timer. When running inside a tokio runtime with a channel back
    /// to the reactor, `Event::FocusSettled` is delivered after `delay`;
    /// otherwise the caller is expected to deliver it.
    pub fn schedule(&mut self, delay: Duration, events_tx: Option<&Sender>) -> u64 {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.pending = Some(generation);

        if let (Some(tx), Ok(runtime)) = (events_tx, tokio::runtime::Handle::try_current()) {
            let tx = tx.clone();
            self.task = Some(runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                tx.send(Event::FocusSettled(generation));
            }));
        }
        trace!(generation, ?delay, "focus debounce armed");
        generation
    }

    /// Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.pending.take().is_some()
    }

    /// Consumes the pending firing if `generation` is the current one.
    pub fn settle(&mut self, generation: u64) -> bool {
        if self.pending != Some(generation) {
            return false;
        }
        self.pending = None;
        self.task = None;
        true
    }

    pub fn pending(&self) -> Option<u64> { self.pending }
}
