//! Timing of the evolution loop.
//!
//! A cycle normally sleeps `interval`; a failed cycle sleeps `error_backoff`.
//! Relay polling piggybacks on the cycle but only runs once per
//! `relay_check_interval`.

use genesis_core::config::EvolutionConfig;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub error_backoff: Duration,
    pub relay_check_interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from(&EvolutionConfig::default())
    }
}

impl From<&EvolutionConfig> for HeartbeatConfig {
    fn from(config: &EvolutionConfig) -> Self {
        Self {
            interval: config.cycle_interval(),
            error_backoff: config.error_backoff(),
            relay_check_interval: config.relay_check_interval(),
        }
    }
}

impl HeartbeatConfig {
    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(10),
            error_backoff: Duration::from_millis(20),
            relay_check_interval: Duration::from_millis(50),
        }
    }

    /// Sleep after a cycle.
    pub fn pause(&self, cycle_failed: bool) -> Duration {
        if cycle_failed {
            self.error_backoff
        } else {
            self.interval
        }
    }
}

/// Tracks when the relay was last polled.
#[derive(Debug)]
pub(crate) struct RelayClock {
    interval: Duration,
    last: Instant,
}

impl RelayClock {
    /// The first check is due one full interval after start.
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    pub(crate) fn due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.interval
    }

    pub(crate) fn mark(&mut self, now: Instant) {
        self.last = now;
    }
}
