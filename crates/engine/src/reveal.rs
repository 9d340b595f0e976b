use tokio::{task::JoinHandle, time::Instant};

/// Ephemeral state for the interval between a submitted answer and the
/// resulting position change. Discarded on any position change; never
/// persisted.
pub(crate) struct Reveal {
    /// Tag tying the pending deferred advance to this cycle. A stale timer
    /// that fires after the cycle ended finds a different tag and does
    /// nothing, so at most one advance happens per cycle.
    pub cycle: u64,
    /// When the answer was submitted; drives the overlay phase.
    pub started: Instant,
    /// The pending deferred-advance task.
    timer: JoinHandle<()>,
}

impl Reveal {
    pub fn new(cycle: u64, timer: JoinHandle<()>) -> Self {
        Self { cycle, started: Instant::now(), timer }
    }

    /// Cancels the deferred advance. Callers must do this before mutating
    /// the position so the timer and a manual advance can never both land.
    pub fn cancel(self) {
        self.timer.abort();
    }
}
