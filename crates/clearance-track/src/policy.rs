//! Polling policy: how long to wait and how often to ask.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TrackError};

/// Bounds for one tracked operation.
///
/// A plain value; every tracked operation gets its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingPolicy {
    /// Give up (as `TimedOut`) once this much time has elapsed.
    #[serde(rename = "max_wait_ms", with = "millis")]
    pub max_wait: Duration,
    /// Pause between consecutive status queries.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
}

impl PollingPolicy {
    pub const fn new(max_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            max_wait,
            poll_interval,
        }
    }

    /// Build from whole seconds and milliseconds.
    pub const fn from_secs_and_millis(max_wait_secs: u64, poll_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_secs(max_wait_secs),
            Duration::from_millis(poll_interval_ms),
        )
    }

    /// Replace the maximum wait.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Replace the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Reject policies that would spin.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(TrackError::InvalidPolicy(
                "poll interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self::from_secs_and_millis(60, 2_000)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
