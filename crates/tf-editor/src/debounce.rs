//! Quiet-period debouncer driven by caller-supplied time.

use std::time::Duration;

/// Fires once after `quiet` has elapsed since the last `touch`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Record a change at `now`, pushing the deadline out.
    pub fn touch(&mut self, now: Duration) {
        self.deadline = Some(now.saturating_add(self.quiet));
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the quiet period has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop a pending deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
