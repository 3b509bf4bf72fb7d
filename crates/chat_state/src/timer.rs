//! Cancellable scheduled tasks owned by the turn state.
//!
//! A task is just a deadline; the driver sleeps until the earliest armed
//! deadline and then polls. Nothing runs in the background, so cancelling is
//! clearing the deadline and cancelling twice is harmless.

use std::time::Duration;

use tokio::time::Instant;

/// Shortest period a repeating task accepts.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduledTask {
    deadline: Option<Instant>,
    period: Option<Duration>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot firing `delay` after `now`, replacing any previous
    /// schedule.
    pub fn schedule_after(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
        self.period = None;
    }

    /// Arms a repeating firing every `period`, first one `period` from `now`.
    /// Periods shorter than a millisecond are raised to one.
    pub fn start_repeating(&mut self, now: Instant, period: Duration) {
        let period = period.max(MIN_PERIOD);
        self.deadline = Some(now + period);
        self.period = Some(period);
    }

    /// Disarms the task. Returns whether it was armed.
    pub fn cancel(&mut self) -> bool {
        self.period = None;
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes a due firing. One-shot tasks disarm; repeating tasks move to
    /// their next period after `now`, so a late poll fires once.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = self.period.map(|period| {
                    let mut next = deadline + period;
                    while next <= now {
                        next += period;
                    }
                    next
                });
                true
            }
            _ => false,
        }
    }
}

/// Earliest of two optional deadlines.
pub fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
