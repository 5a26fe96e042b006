//! Timeout and deadline helpers.

use std::time::{Duration, Instant};

/// Represents a timeout duration for lock operations.
///
/// - `Some(duration)` - Wait up to this duration (`Duration::ZERO` checks once)
/// - `None` - Wait indefinitely
pub type Timeout = Option<Duration>;

/// A point in time after which a blocked acquisition gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    timeout: Timeout,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Starts a deadline `timeout` from now. `None` never passes.
    pub fn after(timeout: Timeout) -> Self {
        Self {
            timeout,
            // Overflowing instants are treated as "never".
            expires_at: timeout.and_then(|d| Instant::now().checked_add(d)),
        }
    }

    /// The timeout this deadline was built from.
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn has_passed(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    /// Time left before the deadline, `None` if it never passes.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
    }

    /// Caps `pause` so a sleep never overshoots the deadline.
    pub fn clamp(&self, pause: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => pause.min(remaining),
            None => pause,
        }
    }
}
