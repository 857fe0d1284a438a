//! Poll scheduling policies.
//!
//! The default is a fixed wall-clock interval: the next fetch is due one period
//! after the previous one was *issued*, whatever happened to it. `CappedBackoff`
//! is opt-in for deployments where repeated failures are costly.

use std::fmt::Debug;
use std::time::Duration;

/// Decides how long after one fetch the next one is issued.
pub trait PollPolicy: Debug + Send + Sync + 'static {
    /// Delay before the next fetch given the current run of failures.
    fn next_delay(&self, consecutive_failures: u32) -> Duration;
}

/// Same period whether fetches succeed or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval(pub Duration);

impl PollPolicy for FixedInterval {
    fn next_delay(&self, _consecutive_failures: u32) -> Duration {
        self.0
    }
}

/// Doubles the period for every consecutive failure, up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CappedBackoff {
    /// Period while healthy.
    pub base: Duration,
    /// Upper bound on the period.
    pub max: Duration,
}

impl PollPolicy for CappedBackoff {
    fn next_delay(&self, consecutive_failures: u32) -> Duration {
        let factor = 1u32.checked_shl(consecutive_failures.min(16)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max.max(self.base))
    }
}
