//! Run control shared between the tick loop and whoever can stop it.
//!
//! The engine wraps a [`RunControl`] in an [`Arc`](std::sync::Arc), hands
//! one clone to the runner and keeps another for its Ctrl-C handler. The
//! stop flag is atomic, so the tick loop never takes a lock.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SimulationBoundsConfig;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// A stop was requested.
    Stopped,
}

/// Shared control state for one run.
#[derive(Debug)]
pub struct RunControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Pause between ticks in milliseconds.
    tick_interval_ms: u64,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Wall-clock time when the control was created.
    started_at: DateTime<Utc>,
}

impl RunControl {
    /// Create control state from the simulation bounds.
    pub fn new(bounds: &SimulationBoundsConfig) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: bounds.tick_interval_ms,
            max_ticks: bounds.max_ticks,
            started_at: Utc::now(),
        }
    }

    /// Request a clean stop after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Pause between ticks in milliseconds.
    pub const fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    /// Whether `current_tick` has reached the limit (never, if unlimited).
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Configured maximum ticks (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Milliseconds since the control was created.
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}
