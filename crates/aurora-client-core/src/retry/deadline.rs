use std::time::{Duration, Instant};

use super::Clock;

/// Wall-clock bound for one logical operation, fixed when the operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    pub fn after(clock: &dyn Clock, budget: Duration) -> Self {
        Self {
            expires_at: clock.now() + budget,
        }
    }

    pub fn remaining(&self, clock: &dyn Clock) -> Duration {
        self.expires_at.saturating_duration_since(clock.now())
    }

    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        self.remaining(clock).is_zero()
    }

    /// This deadline, or `now + budget` if that comes first.
    pub fn capped(self, clock: &dyn Clock, budget: Duration) -> Self {
        self.min(Self::after(clock, budget))
    }
}
