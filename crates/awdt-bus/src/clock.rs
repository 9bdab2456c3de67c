//! Clock driven by tokio time, so paused-time tests move deadlines and
//! wakeups together.

use awdt_storage::Clock;
use awdt_types::Timestamp;
use tokio::time::Instant;

/// Unix seconds measured as `base + elapsed` on the tokio clock.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    base: Timestamp,
    start: Instant,
}

impl RuntimeClock {
    /// Start counting from `base` now.
    #[must_use]
    pub fn starting_at(base: Timestamp) -> Self {
        Self {
            base,
            start: Instant::now(),
        }
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> Timestamp {
        self.base + self.start.elapsed().as_secs()
    }
}
