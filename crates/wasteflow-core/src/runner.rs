//! Headless simulation loop.
//!
//! [`run_simulation`] drives [`World::advance`] until the tick limit is
//! reached or a stop is requested through [`RunControl`], sleeping for the
//! configured interval between ticks and handing every [`TickSummary`] to a
//! [`TickCallback`].

use std::time::Duration;

use tracing::{info, warn};

use crate::control::{RunControl, SimulationEndReason};
use crate::tick::TickSummary;
use crate::world::World;

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes.
    fn on_tick(&mut self, summary: &TickSummary, world: &World);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _world: &World) {}
}

/// Logs the full report and any audit violations every `every` ticks.
pub struct PeriodicReport {
    every: u64,
}

impl PeriodicReport {
    /// Report every `every` ticks (0 disables reporting).
    pub const fn new(every: u64) -> Self {
        Self { every }
    }
}

impl TickCallback for PeriodicReport {
    fn on_tick(&mut self, summary: &TickSummary, world: &World) {
        if self.every == 0 || summary.tick.checked_rem(self.every) != Some(0) {
            return;
        }
        let r = &summary.report;
        info!(
            tick = r.tick,
            total_generated = %r.total_generated,
            total_collected = %r.total_collected,
            total_received = %r.total_received,
            mean_wait_ticks = %r.mean_wait_ticks,
            awaiting_pickup = r.buildings_needing_pickup,
            trips = r.trips_made,
            distance = r.distance_traveled,
            patrolling = r.phases.patrolling,
            collecting = r.phases.collecting,
            returning = r.phases.returning,
            "Periodic report"
        );
        for violation in world.audit() {
            warn!(tick = r.tick, %violation, "Invariant violated");
        }
    }
}

/// Run the simulation loop until a termination condition is met.
///
/// The stop flag is checked before every tick and the tick limit after
/// every tick, so a limit of 5 runs exactly ticks 1 through 5.
pub async fn run_simulation(
    world: &mut World,
    control: &RunControl,
    callback: &mut dyn TickCallback,
) -> SimulationResult {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        start_tick = world.tick(),
        "Simulation starting"
    );

    loop {
        if control.is_stop_requested() {
            info!(tick = world.tick(), "Stop requested");
            return SimulationResult {
                end_reason: SimulationEndReason::Stopped,
                final_summary: last_summary,
                total_ticks,
            };
        }

        let summary = world.advance();
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, world);

        if control.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = control.max_ticks(),
                "Tick limit reached"
            );
            return SimulationResult {
                end_reason: SimulationEndReason::MaxTicksReached,
                final_summary: Some(summary),
                total_ticks,
            };
        }

        last_summary = Some(summary);

        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        } else {
            // Let a pending stop signal run between ticks.
            tokio::task::yield_now().await;
        }
    }
}

/// Log how the run ended.
pub fn log_simulation_end(result: &SimulationResult, control: &RunControl) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        elapsed_ms = control.elapsed_ms(),
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        let r = &summary.report;
        info!(
            tick = summary.tick,
            total_generated = %r.total_generated,
            total_received = %r.total_received,
            trips = r.trips_made,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{SimulationBoundsConfig, SimulationConfig};

    struct CountingCallback {
        ticks: Vec<u64>,
    }

    impl TickCallback for CountingCallback {
        fn on_tick(&mut self, summary: &TickSummary, _world: &World) {
            self.ticks.push(summary.tick);
        }
    }

    /// Requests a stop from inside the loop once `at` is reached.
    struct StopAt {
        at: u64,
        control: Arc<RunControl>,
    }

    impl TickCallback for StopAt {
        fn on_tick(&mut self, summary: &TickSummary, _world: &World) {
            if summary.tick >= self.at {
                self.control.request_stop();
            }
        }
    }

    fn bounds(max_ticks: u64) -> SimulationBoundsConfig {
        SimulationBoundsConfig {
            max_ticks,
            tick_interval_ms: 0,
            report_every: 0,
        }
    }

    #[tokio::test]
    async fn runs_exactly_max_ticks() {
        let mut world = World::new(&SimulationConfig::default()).unwrap();
        let control = RunControl::new(&bounds(5));
        let mut callback = CountingCallback { ticks: Vec::new() };

        let result = run_simulation(&mut world, &control, &mut callback).await;

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(result.final_summary.unwrap().tick, 5);
        assert_eq!(callback.ticks, vec![1, 2, 3, 4, 5]);
        assert_eq!(world.tick(), 5);
    }

    #[tokio::test]
    async fn stop_request_ends_unbounded_run() {
        let mut world = World::new(&SimulationConfig::default()).unwrap();
        let control = Arc::new(RunControl::new(&bounds(0)));
        let mut callback = StopAt {
            at: 3,
            control: Arc::clone(&control),
        };

        let result = run_simulation(&mut world, &control, &mut callback).await;

        assert_eq!(result.end_reason, SimulationEndReason::Stopped);
        assert_eq!(result.total_ticks, 3);
        assert_eq!(result.final_summary.map(|s| s.tick), Some(3));
    }

    #[tokio::test]
    async fn stop_before_start_runs_nothing() {
        let mut world = World::new(&SimulationConfig::default()).unwrap();
        let control = RunControl::new(&bounds(10));
        control.request_stop();

        let result = run_simulation(&mut world, &control, &mut NoOpCallback).await;
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
        log_simulation_end(&result, &control);
    }

    #[test]
    fn periodic_report_respects_interval() {
        let mut world = World::new(&SimulationConfig::default()).unwrap();
        let mut reporter = PeriodicReport::new(0);
        let summary = world.advance();
        // Disabled reporting must not panic on a zero interval.
        reporter.on_tick(&summary, &world);
        let mut reporter = PeriodicReport::new(1);
        reporter.on_tick(&summary, &world);
    }
}
