//! The JSON document printed to stdout when a run ends.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use wasteflow_core::{SimulationConfig, SimulationEndReason, SimulationResult, World};
use wasteflow_types::{Topology, WorldReport};

/// Summary of one headless run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Unique, time-ordered id of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: DateTime<Utc>,
    /// Why the run ended.
    pub end_reason: SimulationEndReason,
    /// Ticks executed by this run.
    pub total_ticks: u64,
    /// Seed the world was built from.
    pub seed: u64,
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Grid topology.
    pub topology: Topology,
    /// Number of buildings.
    pub buildings: usize,
    /// Number of trucks.
    pub trucks: usize,
    /// Loads accepted by the disposal site.
    pub deliveries: u64,
    /// Aggregate quantities after the last tick.
    pub report: WorldReport,
}

impl RunReport {
    /// Assemble the report for a finished run.
    pub fn new(
        config: &SimulationConfig,
        world: &World,
        result: &SimulationResult,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at,
            ended_at: Utc::now(),
            end_reason: result.end_reason,
            total_ticks: result.total_ticks,
            seed: config.world.seed,
            width: world.grid().width(),
            height: world.grid().height(),
            topology: world.grid().topology(),
            buildings: world.sources().len(),
            trucks: world.collectors().len(),
            deliveries: world.sink().deliveries(),
            report: world.report().clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wasteflow_core::control::RunControl;
    use wasteflow_core::runner::NoOpCallback;
    use wasteflow_core::run_simulation;

    use super::*;

    #[tokio::test]
    async fn report_describes_the_run() {
        let mut config = SimulationConfig::default();
        config.simulation.max_ticks = 20;
        let mut world = World::new(&config).unwrap();
        let control = RunControl::new(&config.simulation);
        let result = run_simulation(&mut world, &control, &mut NoOpCallback).await;

        let report = RunReport::new(&config, &world, &result, control.started_at());
        assert!(report.ended_at >= report.started_at);
        assert_eq!(report.report.tick, 20);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json.get("end_reason").unwrap().as_str(), Some("max_ticks_reached"));
        assert_eq!(json.get("total_ticks").unwrap().as_u64(), Some(20));
        assert_eq!(json.get("seed").unwrap().as_u64(), Some(42));
        assert_eq!(json.get("topology").unwrap().as_str(), Some("toroidal"));
        assert_eq!(json.get("buildings").unwrap().as_u64(), Some(10));
        assert_eq!(json.get("trucks").unwrap().as_u64(), Some(2));
        assert!(json.get("run_id").unwrap().is_string());
        assert_eq!(report.deliveries, report.report.trips_made);
        assert_eq!(json.get("deliveries").unwrap().as_u64(), Some(report.deliveries));
    }
}
