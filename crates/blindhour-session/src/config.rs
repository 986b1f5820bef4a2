use std::time::Duration;

use blindhour_core::types::ContestId;
use blindhour_sim::SimParams;

/// Refresh intervals below this are raised to it.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Tracking a real contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContestConfig {
    pub contest_id: ContestId,
    /// Freeze boundary, in minutes from the contest start.
    pub freeze_minutes: u32,
    pub refresh_interval: Duration,
}

impl ContestConfig {
    pub fn new(contest_id: ContestId) -> Self {
        Self {
            contest_id,
            freeze_minutes: 60,
            refresh_interval: Duration::from_secs(30),
        }
    }

    pub fn with_freeze_minutes(mut self, minutes: u32) -> Self {
        self.freeze_minutes = minutes;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn freeze_seconds(&self) -> u64 {
        u64::from(self.freeze_minutes) * 60
    }

    pub fn effective_refresh_interval(&self) -> Duration {
        self.refresh_interval.max(MIN_REFRESH_INTERVAL)
    }
}

/// A time-compressed synthetic contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub params: SimParams,
    /// Wall-clock time the whole simulated contest is squeezed into.
    pub wall_budget: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: SimParams::default(),
            wall_budget: Duration::from_secs(240),
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    /// Simulated seconds per wall-clock second.
    pub fn compression_ratio(&self) -> f64 {
        let params = self.params.normalized();
        let simulated = f64::from(params.duration_minutes) * 60.0;
        simulated / self.wall_budget.as_secs_f64().max(0.001)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// How long a stop waits for the worker before detaching it.
    pub stop_timeout: Duration,
    /// Simulation ticker period.
    pub tick_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(5),
            tick_interval: Duration::from_secs(1),
        }
    }
}
