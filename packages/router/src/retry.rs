//! Redelivery policy: bounded attempt counts and capped backoff.
//!
//! Redelivery re-executes the whole route body with the original inbound
//! message after a technical failure. Faults are never retried: a fault is a
//! successfully-delivered business error, so it never reaches this policy.

use std::time::Duration;

/// Backoff arithmetic for redelivering a failed route body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedeliveryPolicy {
    /// Additional attempts after the first, i.e. 1 means "try twice in total".
    pub max_redeliveries: u32,
    /// Delay before the first redelivery.
    pub initial_delay: Duration,
    /// Multiplier applied per redelivery; 1.0 keeps the delay fixed.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RedeliveryPolicy {
    fn default() -> Self {
        Self {
            max_redeliveries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RedeliveryPolicy {
    /// Fixed-delay policy: every redelivery waits `delay`.
    #[must_use]
    pub fn fixed(max_redeliveries: u32, delay: Duration) -> Self {
        Self {
            max_redeliveries,
            initial_delay: delay,
            backoff_multiplier: 1.0,
            max_delay: delay,
        }
    }

    /// Whether another redelivery is allowed after `attempted` redeliveries
    /// have already been performed.
    #[must_use]
    pub fn should_redeliver(&self, attempted: u32) -> bool {
        attempted < self.max_redeliveries
    }

    /// Delay before redelivery number `attempt` (0-based), capped at
    /// `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Multipliers below 1.0 would shrink delays toward zero; clamp so the
        // sequence stays monotonic.
        let multiplier = self.backoff_multiplier.max(1.0);
        #[allow(clippy::cast_possible_wrap)]
        let factor = multiplier.powi(attempt.min(64) as i32);
        let raw = self.initial_delay.as_secs_f64() * factor;
        let capped = raw.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}
