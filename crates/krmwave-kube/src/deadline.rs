//! Wait budget shared by every condition of one hook run
//!
//! A [`Deadline`] is fixed when a hook run starts and is never moved. Waiters
//! compute their own remaining budget from it, so time spent on an earlier
//! condition is no longer available to later ones.

use std::time::Duration;

use tokio::time::Instant;

/// An absolute point in time plus the budget it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// The full budget this deadline was created with
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Budget left, zero once the deadline has passed
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }
}
