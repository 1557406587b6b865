//! Adaptive inter-request pacing for a scan pass.
//!
//! The delay climbs by a fixed step whenever the upstream shows any sign of
//! defending itself and bleeds back toward the floor while requests go
//! through cleanly. Each wait is jittered so requests never land on a fixed
//! interval.

use std::time::Duration;

use rand::Rng;

use farescout_core::AppConfig;

/// Tunables for [`ScanDelayState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub floor: Duration,
    pub ceiling: Duration,
    /// Added on every blocking signal.
    pub increment: Duration,
    /// Removed after every clean request.
    pub decrement: Duration,
    /// Width of the uniform window added on top of the current delay.
    pub jitter: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            floor: Duration::from_secs(15),
            ceiling: Duration::from_secs(60),
            increment: Duration::from_secs(10),
            decrement: Duration::from_secs(2),
            jitter: Duration::from_secs(10),
        }
    }
}

impl PacingPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            floor: Duration::from_secs(config.delay_floor_secs),
            ceiling: Duration::from_secs(config.delay_ceiling_secs),
            increment: Duration::from_secs(config.delay_increment_secs),
            decrement: Duration::from_secs(config.delay_decrement_secs),
            jitter: Duration::from_secs(config.delay_jitter_secs),
        }
    }

    /// A fresh state sitting at the floor.
    #[must_use]
    pub fn initial_state(&self) -> ScanDelayState {
        ScanDelayState::new(self.floor, self.floor, self.ceiling)
    }
}

/// Current pacing delay, always within `[floor, ceiling]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanDelayState {
    current: Duration,
    floor: Duration,
    ceiling: Duration,
}

impl ScanDelayState {
    /// Builds a state with `current` clamped into range. A `ceiling` below
    /// `floor` is raised to `floor`.
    #[must_use]
    pub fn new(current: Duration, floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            current: current.clamp(floor, ceiling),
            floor,
            ceiling,
        }
    }

    #[must_use]
    pub fn current(&self) -> Duration {
        self.current
    }

    #[must_use]
    pub fn floor(&self) -> Duration {
        self.floor
    }

    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn back_off(&mut self, increment: Duration) {
        self.current = self.current.saturating_add(increment).min(self.ceiling);
    }

    pub fn recover(&mut self, decrement: Duration) {
        if self.current > self.floor {
            self.current = self.current.saturating_sub(decrement).max(self.floor);
        }
    }

    /// Draws the next wait uniformly from `[current, current + jitter]`.
    #[must_use]
    pub fn next_wait(&self, jitter: Duration) -> Duration {
        let span_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
        if span_ms == 0 {
            return self.current;
        }
        let extra_ms = rand::rng().random_range(0..=span_ms);
        self.current.saturating_add(Duration::from_millis(extra_ms))
    }
}
