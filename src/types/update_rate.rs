//! Delivery rate of monitor subscriptions.
//!
//! A [`Monitor`](crate::Monitor) reads its specification once per poll
//! interval. Each subscriber chooses how many of those samples it wants to
//! see: all of them, or at most `hz` per second. A throttled subscriber
//! always receives the newest sample of each period; older samples read in
//! between are skipped, never queued.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sample delivery rate requested by a subscriber.
///
/// In YAML: `update_rate: Native` or `update_rate: !Max 5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// One item per successful read
    #[default]
    Native,

    /// At most this many items per second.
    ///
    /// `Max(0)` and any rate at or above the poll rate deliver every sample.
    Max(u32),
}

impl UpdateRate {
    /// Resolve against a monitor polling every `poll_interval`.
    ///
    /// Returns `Native` when throttling would never drop a sample.
    pub fn normalize(self, poll_interval: Duration) -> Self {
        match self {
            UpdateRate::Max(hz) if hz > 0 && Self::period_of(hz) > poll_interval => self,
            _ => UpdateRate::Native,
        }
    }

    /// Minimum spacing between delivered samples, `None` when unthrottled.
    pub fn throttle_period(self, poll_interval: Duration) -> Option<Duration> {
        match self.normalize(poll_interval) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Self::period_of(hz)),
        }
    }

    fn period_of(hz: u32) -> Duration {
        Duration::from_secs(1) / hz
    }
}

impl std::fmt::Display for UpdateRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateRate::Native => f.write_str("native"),
            UpdateRate::Max(hz) => write!(f, "max {hz} Hz"),
        }
    }
}
