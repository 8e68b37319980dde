//! The world: grid, buildings, trucks, disposal site and the tick loop.
//!
//! # Construction
//!
//! [`World::new`] builds a randomized world from a [`SimulationConfig`];
//! [`WorldBuilder`] places agents at explicit cells for reproducible
//! scenarios. Both end the same way: the disposal site goes to `(0, 0)` and
//! anything already standing there is moved to a random empty cell.
//!
//! # Advancing
//!
//! [`World::advance`] runs one tick in a fixed order:
//!
//! 1. Every building generates, by id.
//! 2. Every truck runs its `speed` sub-steps, by id. Claims made by one
//!    truck are visible to every later truck in the same tick.
//! 3. The ledger closes the tick and reconciles against actual holdings.
//! 4. The aggregate report is recomputed.
//!
//! Advancing never fails. Ledger anomalies are logged and returned in the
//! [`TickSummary`].

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use wasteflow_agents::{ClaimRegistry, Collector, CollectorParams, StepContext};
use wasteflow_ledger::{ConservationResult, Ledger, LedgerAnomaly};
use wasteflow_types::{
    AgentView, CollectorId, FlowParty, Occupant, Position, SourceId, Topology, WorldReport,
};
use wasteflow_world::{DisposalSink, Grid, SourceParams, TrashSource, WorldError};

use crate::audit::{self, InvariantViolation};
use crate::clock::WorldClock;
use crate::config::SimulationConfig;
use crate::error::ConfigurationError;
use crate::metrics;
use crate::population;
use crate::tick::TickSummary;

/// The simulated town.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    sources: Vec<TrashSource>,
    collectors: Vec<Collector>,
    sink: DisposalSink,
    claims: ClaimRegistry,
    ledger: Ledger,
    rng: SmallRng,
    clock: WorldClock,
    report: WorldReport,
}

impl World {
    /// Build a randomized world from configuration.
    ///
    /// Buildings are created first, then trucks, each at a random empty
    /// cell with parameters drawn from the configured ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the configuration fails
    /// [`SimulationConfig::validate`] or the agents cannot be placed.
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let grid = Grid::new(config.world.width, config.world.height, config.world.topology)?;
        let mut world = Self::empty(grid, config.world.seed);

        for _ in 0..config.population.buildings {
            let params = population::sample_source_params(&config.buildings, &mut world.rng);
            let position = world.random_empty_cell()?;
            world.add_source(position, &params)?;
        }
        for _ in 0..config.population.trucks {
            let params = population::sample_collector_params(&config.trucks, &mut world.rng);
            let position = world.random_empty_cell()?;
            world.add_collector(position, params)?;
        }

        world.finish()?;
        info!(
            width = config.world.width,
            height = config.world.height,
            topology = ?config.world.topology,
            seed = config.world.seed,
            buildings = world.sources.len(),
            trucks = world.collectors.len(),
            "World created"
        );
        Ok(world)
    }

    /// Start an explicit-placement builder for a `width` x `height` grid.
    pub fn builder(width: u32, height: u32) -> WorldBuilder {
        WorldBuilder::new(width, height)
    }

    fn empty(grid: Grid, seed: u64) -> Self {
        Self {
            grid,
            sources: Vec::new(),
            collectors: Vec::new(),
            sink: DisposalSink::new(Position::ORIGIN),
            claims: ClaimRegistry::new(),
            ledger: Ledger::new(),
            rng: SmallRng::seed_from_u64(seed),
            clock: WorldClock::new(),
            report: WorldReport::default(),
        }
    }

    fn random_empty_cell(&mut self) -> Result<Position, ConfigurationError> {
        Ok(self
            .grid
            .random_empty_cell(&mut self.rng)
            .ok_or(WorldError::NoEmptyCell)?)
    }

    fn check_free(&self, position: Position) -> Result<(), ConfigurationError> {
        if !self.grid.contains(position) {
            return Err(WorldError::OutOfBounds(position).into());
        }
        if !self.grid.is_cell_empty(position) {
            return Err(ConfigurationError::invalid(format!(
                "cell {position} is already occupied"
            )));
        }
        Ok(())
    }

    fn add_source(
        &mut self,
        position: Position,
        params: &SourceParams,
    ) -> Result<SourceId, ConfigurationError> {
        self.check_free(position)?;
        let index = u32::try_from(self.sources.len())
            .map_err(|e| ConfigurationError::invalid(format!("too many buildings: {e}")))?;
        let source = TrashSource::new(SourceId::new(index), position, params)?;
        self.grid.place(source.occupant(), position)?;
        let id = source.id();
        self.sources.push(source);
        Ok(id)
    }

    fn add_collector(
        &mut self,
        position: Position,
        params: CollectorParams,
    ) -> Result<CollectorId, ConfigurationError> {
        self.check_free(position)?;
        let index = u32::try_from(self.collectors.len())
            .map_err(|e| ConfigurationError::invalid(format!("too many trucks: {e}")))?;
        let collector = Collector::new(CollectorId::new(index), position, params)?;
        self.grid.place(collector.occupant(), position)?;
        let id = collector.id();
        self.collectors.push(collector);
        Ok(id)
    }

    /// Check the truck/building capacity rule, place the disposal site and
    /// compute the initial report.
    fn finish(&mut self) -> Result<(), ConfigurationError> {
        let largest_building = self
            .sources
            .iter()
            .map(TrashSource::capacity)
            .max()
            .unwrap_or(Decimal::ZERO);
        if let Some(small) = self
            .collectors
            .iter()
            .find(|c| c.capacity() < largest_building)
        {
            return Err(ConfigurationError::invalid(format!(
                "{} (capacity {}) cannot empty the largest building (capacity {largest_building})",
                small.id(),
                small.capacity()
            )));
        }

        self.install_sink()?;
        self.report = metrics::world_report(
            self.clock.tick(),
            &self.sources,
            &self.collectors,
            &self.sink,
        );
        Ok(())
    }

    /// Put the disposal site at its corner, moving any occupant already
    /// there to a random empty cell.
    fn install_sink(&mut self) -> Result<(), ConfigurationError> {
        let origin = self.sink.position();
        let displaced: Vec<Occupant> = self.grid.occupants_at(origin).collect();
        self.grid.place(self.sink.occupant(), origin)?;

        for occupant in displaced {
            let to = self.random_empty_cell()?;
            match occupant {
                Occupant::Source(id) => {
                    if let Some(source) = self.sources.get_mut(id.slot()) {
                        source.relocate(&mut self.grid, to)?;
                    }
                }
                Occupant::Collector(id) => {
                    if let Some(collector) = self.collectors.get_mut(id.slot()) {
                        collector.relocate(&mut self.grid, to)?;
                    }
                }
                Occupant::Sink => continue,
            }
            debug!(%occupant, from = %origin, %to, "Displaced by disposal site");
        }
        Ok(())
    }

    /// Run one tick. Never fails.
    pub fn advance(&mut self) -> TickSummary {
        let tick = match self.clock.advance() {
            Ok(tick) => tick,
            Err(e) => {
                warn!(error = %e, "Clock saturated, repeating final tick");
                self.clock.tick()
            }
        };

        // --- Buildings ---
        let mut generated = Decimal::ZERO;
        let mut requests_raised = Vec::new();
        for source in &mut self.sources {
            let outcome = source.step();
            if outcome.generated > Decimal::ZERO {
                generated = generated.saturating_add(outcome.generated);
                if let Err(e) = self
                    .ledger
                    .record_generation(tick, source.id(), outcome.generated)
                {
                    warn!(source = %source.id(), error = %e, "Failed to record generation");
                }
            }
            if outcome.request_raised {
                debug!(source = %source.id(), fill = %source.fill_level(), "Pickup requested");
                requests_raised.push(source.id());
            }
        }

        // --- Trucks ---
        let mut events = Vec::new();
        {
            let mut ctx = StepContext {
                tick,
                grid: &mut self.grid,
                sources: &mut self.sources,
                sink: &mut self.sink,
                claims: &mut self.claims,
                ledger: &mut self.ledger,
                rng: &mut self.rng,
                events: &mut events,
            };
            for collector in &mut self.collectors {
                collector.step(&mut ctx);
            }
        }

        // --- Ledger ---
        let closed = self.ledger.close_tick(tick);
        let mut anomalies: Vec<LedgerAnomaly> = Vec::new();
        if let ConservationResult::Anomaly(anomaly) = closed.result {
            warn!(tick, %anomaly, "Malformed trash flows");
            anomalies.push(anomaly);
        }
        if let ConservationResult::Anomaly(anomaly) = self.ledger.reconcile(tick, &self.holdings())
        {
            warn!(tick, %anomaly, "Holdings disagree with ledger");
            anomalies.push(anomaly);
        }

        // --- Report ---
        self.report = metrics::world_report(tick, &self.sources, &self.collectors, &self.sink);

        let summary = TickSummary {
            tick,
            generated,
            requests_raised,
            events,
            flow_entries: closed.entries.len(),
            anomalies,
            report: self.report.clone(),
        };
        info!(
            tick,
            generated = %summary.generated,
            harvested = %summary.harvested(),
            deposited = %summary.deposited(),
            awaiting_pickup = self.report.buildings_needing_pickup,
            "Tick complete"
        );
        summary
    }

    /// What every party currently holds, keyed the way the ledger keys it.
    pub fn holdings(&self) -> BTreeMap<FlowParty, Decimal> {
        let mut holdings = BTreeMap::new();
        for source in &self.sources {
            holdings.insert(FlowParty::Source(source.id()), source.fill_level());
        }
        for collector in &self.collectors {
            holdings.insert(FlowParty::Collector(collector.id()), collector.load());
        }
        holdings.insert(FlowParty::Sink, self.sink.total_received());
        holdings
    }

    /// Check every structural and conservation invariant.
    ///
    /// Returns an empty list when the world is consistent.
    pub fn audit(&self) -> Vec<InvariantViolation> {
        audit::audit(self)
    }

    /// One view per agent: buildings by id, trucks by id, then the
    /// disposal site.
    pub fn agent_views(&self) -> Vec<AgentView> {
        metrics::agent_views(&self.sources, &self.collectors, &self.sink)
    }

    /// Aggregates as of the last completed tick.
    pub const fn report(&self) -> &WorldReport {
        &self.report
    }

    /// Current tick (0 before the first advance).
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The occupancy grid.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// All buildings in id order.
    pub fn sources(&self) -> &[TrashSource] {
        &self.sources
    }

    /// A building by id.
    pub fn source(&self, id: SourceId) -> Option<&TrashSource> {
        self.sources.get(id.slot()).filter(|s| s.id() == id)
    }

    /// All trucks in id order.
    pub fn collectors(&self) -> &[Collector] {
        &self.collectors
    }

    /// A truck by id.
    pub fn collector(&self, id: CollectorId) -> Option<&Collector> {
        self.collectors.get(id.slot()).filter(|c| c.id() == id)
    }

    /// The disposal site.
    pub const fn sink(&self) -> &DisposalSink {
        &self.sink
    }

    /// Active claims.
    pub const fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    /// The trash-flow ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// Places buildings and trucks at explicit cells.
///
/// Agents get ids in the order they are added. The disposal site is placed
/// last, at `(0, 0)`, displacing whatever was put there.
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    width: u32,
    height: u32,
    topology: Topology,
    seed: u64,
    buildings: Vec<(Position, SourceParams)>,
    trucks: Vec<(Position, CollectorParams)>,
}

impl WorldBuilder {
    /// A builder for an empty toroidal `width` x `height` grid with seed 0.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            topology: Topology::default(),
            seed: 0,
            buildings: Vec::new(),
            trucks: Vec::new(),
        }
    }

    /// Set the grid topology.
    #[must_use]
    pub const fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Add a building at `position`.
    #[must_use]
    pub fn building(mut self, position: Position, params: SourceParams) -> Self {
        self.buildings.push((position, params));
        self
    }

    /// Add a truck at `position`.
    #[must_use]
    pub fn truck(mut self, position: Position, params: CollectorParams) -> Self {
        self.trucks.push((position, params));
        self
    }

    /// Build the world.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if no building or no truck was added,
    /// the grid is empty or too small for
    /// every agent plus the disposal site, a cell is off-grid or taken,
    /// parameters are invalid, or a truck is smaller than the largest
    /// building.
    pub fn build(self) -> Result<World, ConfigurationError> {
        if self.buildings.is_empty() {
            return Err(ConfigurationError::invalid("at least one building is required"));
        }
        if self.trucks.is_empty() {
            return Err(ConfigurationError::invalid("at least one truck is required"));
        }
        let grid = Grid::new(self.width, self.height, self.topology)?;
        let needed = self
            .buildings
            .len()
            .saturating_add(self.trucks.len())
            .saturating_add(1);
        if grid.cell_count() < needed {
            return Err(ConfigurationError::invalid(format!(
                "{}x{} grid is too small for {needed} agents",
                self.width, self.height
            )));
        }

        let mut world = World::empty(grid, self.seed);
        for (position, params) in &self.buildings {
            world.add_source(*position, params)?;
        }
        for (position, params) in self.trucks {
            world.add_collector(position, params)?;
        }
        world.finish()?;
        Ok(world)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wasteflow_types::CollectorPhase;

    use super::*;

    fn truck(capacity: i64, speed: u32) -> CollectorParams {
        CollectorParams {
            capacity: Decimal::new(capacity, 0),
            speed,
        }
    }

    fn building(capacity: i64, rate: i64) -> SourceParams {
        SourceParams::new(Decimal::new(capacity, 0), Decimal::new(rate, 0))
    }

    #[test]
    fn random_world_matches_config() {
        let config = SimulationConfig::default();
        let world = World::new(&config).unwrap();
        assert_eq!(world.sources().len(), 10);
        assert_eq!(world.collectors().len(), 2);
        assert_eq!(world.sink().position(), Position::ORIGIN);
        assert_eq!(world.grid().occupant_count(), 13);
        assert!(world.audit().is_empty());
    }

    #[test]
    fn same_seed_same_world() {
        let config = SimulationConfig::default();
        let mut a = World::new(&config).unwrap();
        let mut b = World::new(&config).unwrap();
        for _ in 0..50 {
            assert_eq!(a.advance().report, b.advance().report);
        }
        assert_eq!(a.agent_views(), b.agent_views());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SimulationConfig::default();
        config.world.width = 2;
        config.world.height = 2;
        assert!(matches!(
            World::new(&config),
            Err(ConfigurationError::Invalid { .. })
        ));
    }

    #[test]
    fn sink_displaces_occupant_at_origin() {
        let world = World::builder(5, 5)
            .topology(Topology::Bounded)
            .building(Position::new(4, 4), building(10, 10))
            .truck(Position::ORIGIN, truck(50, 1))
            .build()
            .unwrap();
        let t = world.collector(CollectorId::new(0)).unwrap();
        assert_ne!(t.position(), Position::ORIGIN);
        assert!(world.grid().is_at(t.occupant(), t.position()));
        assert_eq!(
            world.grid().occupants_at(Position::ORIGIN).collect::<Vec<_>>(),
            vec![Occupant::Sink]
        );
    }

    #[test]
    fn builder_rejects_taken_and_off_grid_cells() {
        let taken = World::builder(4, 4)
            .building(Position::new(1, 1), building(10, 1))
            .truck(Position::new(1, 1), truck(20, 1))
            .build();
        assert!(matches!(taken, Err(ConfigurationError::Invalid { .. })));

        let off_grid = World::builder(4, 4)
            .building(Position::new(4, 0), building(10, 1))
            .truck(Position::new(2, 2), truck(20, 1))
            .build();
        assert!(matches!(off_grid, Err(ConfigurationError::World(_))));
    }

    #[test]
    fn builder_rejects_small_trucks() {
        let result = World::builder(4, 4)
            .building(Position::new(1, 1), building(15, 1))
            .truck(Position::new(2, 2), truck(10, 1))
            .build();
        assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));
    }

    #[test]
    fn builder_rejects_overfull_grid() {
        let result = World::builder(1, 2)
            .building(Position::new(0, 1), building(5, 1))
            .truck(Position::ORIGIN, truck(5, 1))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_requires_buildings_and_trucks() {
        let empty = World::builder(3, 3).build();
        assert!(matches!(empty, Err(ConfigurationError::Invalid { .. })));

        let no_buildings = World::builder(3, 3)
            .truck(Position::new(1, 1), truck(20, 1))
            .build();
        assert!(matches!(no_buildings, Err(ConfigurationError::Invalid { .. })));

        let no_trucks = World::builder(3, 3)
            .building(Position::new(1, 1), building(10, 1))
            .build();
        assert!(matches!(no_trucks, Err(ConfigurationError::Invalid { .. })));
    }

    #[test]
    fn builder_rejects_bad_parameters() {
        let result = World::builder(4, 4)
            .building(Position::new(1, 1), building(5, 1))
            .truck(Position::new(2, 2), truck(10, 0))
            .build();
        assert!(matches!(result, Err(ConfigurationError::Agent(_))));
    }

    #[test]
    fn advance_records_and_balances() {
        let mut world = World::builder(6, 6)
            .topology(Topology::Bounded)
            .building(Position::new(3, 3), building(10, 5))
            .truck(Position::new(1, 1), truck(20, 1))
            .build()
            .unwrap();

        let first = world.advance();
        assert_eq!(first.tick, 1);
        assert_eq!(first.generated, Decimal::new(5, 0));
        assert!(first.requests_raised.is_empty());
        assert!(first.is_balanced());

        let second = world.advance();
        assert_eq!(second.requests_raised, vec![SourceId::new(0)]);
        assert_eq!(second.claims_made(), 1);
        assert_eq!(
            world.collector(CollectorId::new(0)).unwrap().phase(),
            CollectorPhase::Collecting
        );
        assert_eq!(world.report().buildings_needing_pickup, 1);
        assert_eq!(world.ledger().total_generated(), Decimal::TEN);
        assert!(world.audit().is_empty());
    }
}
