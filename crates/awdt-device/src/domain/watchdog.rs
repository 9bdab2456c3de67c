//! # Watchdog Countdown
//!
//! ```text
//!   arm(now, T)         defer(now, D)
//!        │                   │
//! ───────●───── polls ───────●───── polls ──────────▶ now > deadline ⇒ reset
//!        deadline = now+T    deadline = now+D
//! ```
//!
//! Expiry is strict: the device resets once `now` has passed the deadline,
//! never at or before it.

use awdt_types::Timestamp;

/// Deadline of the device watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    deadline: Timestamp,
}

impl Countdown {
    /// Seed from a boot ticket's `counter_init_seconds`.
    #[must_use]
    pub fn arm(now: Timestamp, seconds: u64) -> Self {
        Self {
            deadline: now.saturating_add(seconds),
        }
    }

    /// Apply a deferral ticket: the deadline becomes `now + seconds`.
    pub fn defer(&mut self, now: Timestamp, seconds: u64) {
        self.deadline = now.saturating_add(seconds);
    }

    #[must_use]
    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.deadline
    }

    /// Seconds left before expiry.
    #[must_use]
    pub fn remaining(&self, now: Timestamp) -> u64 {
        self.deadline.saturating_sub(now)
    }
}
