//! Invariant audit.
//!
//! [`audit`] inspects a whole [`World`] and lists everything that is out of
//! place. A healthy world always yields an empty list; tests call it after
//! every tick and the engine logs any violations at report intervals.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use wasteflow_agents::Collector;
use wasteflow_ledger::ConservationResult;
use wasteflow_types::{CollectorId, Occupant, Position, SourceId};
use wasteflow_world::{Grid, TrashSource};

use crate::metrics;
use crate::world::World;

/// A broken world invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A building's fill is negative or above capacity.
    #[error("{source_id} fill {fill} outside 0..={capacity}")]
    FillOutOfBounds {
        /// The building.
        source_id: SourceId,
        /// Its fill level.
        fill: Decimal,
        /// Its capacity.
        capacity: Decimal,
    },

    /// A truck's load is negative or above capacity.
    #[error("{collector} load {load} outside 0..={capacity}")]
    LoadOutOfBounds {
        /// The truck.
        collector: CollectorId,
        /// Its load.
        load: Decimal,
        /// Its capacity.
        capacity: Decimal,
    },

    /// Two trucks target the same building.
    #[error("{source_id} is targeted by both {first} and {second}")]
    DuplicateTarget {
        /// The building.
        source_id: SourceId,
        /// Lower-id truck.
        first: CollectorId,
        /// Higher-id truck.
        second: CollectorId,
    },

    /// The claim registry and a truck's state disagree.
    #[error("claim on {source_id}: registry says {registry:?}, truck state says {state:?}")]
    ClaimMismatch {
        /// The building.
        source_id: SourceId,
        /// Holder according to the registry.
        registry: Option<CollectorId>,
        /// Truck whose state targets the building.
        state: Option<CollectorId>,
    },

    /// An agent's stored position is not where the grid has it.
    #[error("{occupant} believes it is at {position} but the grid disagrees")]
    PositionMismatch {
        /// The agent.
        occupant: Occupant,
        /// Position stored on the agent.
        position: Position,
    },

    /// The grid records an occupant at a cell the agent does not believe
    /// it is in.
    #[error("grid records {occupant} at {recorded} but the agent is at {actual:?}")]
    StaleGridRecord {
        /// The recorded occupant.
        occupant: Occupant,
        /// Cell holding the record.
        recorded: Position,
        /// Position stored on the agent, if it exists at all.
        actual: Option<Position>,
    },

    /// The grid holds a different number of occupants than there are
    /// agents.
    #[error("grid holds {on_grid} occupants but the world has {agents} agents")]
    OccupantCountMismatch {
        /// Occupants recorded on the grid.
        on_grid: usize,
        /// Buildings, trucks and the disposal site.
        agents: usize,
    },

    /// Generated trash is not fully accounted for.
    #[error("generated {generated} but only {accounted} is held or delivered")]
    ConservationBroken {
        /// Total generated by all buildings.
        generated: Decimal,
        /// Delivered plus carried plus waiting in buildings.
        accounted: Decimal,
    },

    /// The ledger disagrees with actual holdings.
    #[error("ledger: {message}")]
    LedgerMismatch {
        /// The anomaly message.
        message: String,
    },
}

/// Check every invariant of `world`.
pub fn audit(world: &World) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    check_bounds(world, &mut violations);
    check_claims(world, &mut violations);
    check_positions(world, &mut violations);
    check_conservation(world, &mut violations);
    violations
}

fn check_bounds(world: &World, out: &mut Vec<InvariantViolation>) {
    for s in world.sources() {
        if s.fill_level().is_sign_negative() || s.fill_level() > s.capacity() {
            out.push(InvariantViolation::FillOutOfBounds {
                source_id: s.id(),
                fill: s.fill_level(),
                capacity: s.capacity(),
            });
        }
    }
    for c in world.collectors() {
        if c.load().is_sign_negative() || c.load() > c.capacity() {
            out.push(InvariantViolation::LoadOutOfBounds {
                collector: c.id(),
                load: c.load(),
                capacity: c.capacity(),
            });
        }
    }
}

fn check_claims(world: &World, out: &mut Vec<InvariantViolation>) {
    let mut targeted: BTreeMap<SourceId, CollectorId> = BTreeMap::new();
    for c in world.collectors() {
        let Some(target) = c.target() else {
            continue;
        };
        if let Some(&first) = targeted.get(&target) {
            out.push(InvariantViolation::DuplicateTarget {
                source_id: target,
                first,
                second: c.id(),
            });
            continue;
        }
        targeted.insert(target, c.id());
        if world.claims().holder(target) != Some(c.id()) {
            out.push(InvariantViolation::ClaimMismatch {
                source_id: target,
                registry: world.claims().holder(target),
                state: Some(c.id()),
            });
        }
    }
    for (source_id, holder) in world.claims().iter() {
        if targeted.get(&source_id) != Some(&holder) {
            out.push(InvariantViolation::ClaimMismatch {
                source_id,
                registry: Some(holder),
                state: targeted.get(&source_id).copied(),
            });
        }
    }
}

fn check_positions(world: &World, out: &mut Vec<InvariantViolation>) {
    let grid = world.grid();
    let mut check = |occupant: Occupant, position: Position| {
        if !grid.is_at(occupant, position) {
            out.push(InvariantViolation::PositionMismatch { occupant, position });
        }
    };
    for s in world.sources() {
        check(s.occupant(), s.position());
    }
    for c in world.collectors() {
        check(c.occupant(), c.position());
    }
    check(world.sink().occupant(), world.sink().position());

    out.extend(stale_records(grid, |occupant| locate(world, occupant)));

    let agents = world
        .sources()
        .len()
        .saturating_add(world.collectors().len())
        .saturating_add(1);
    let on_grid = grid.occupant_count();
    if on_grid != agents {
        out.push(InvariantViolation::OccupantCountMismatch { on_grid, agents });
    }
}

/// Where `occupant` believes it is, or `None` if no such agent exists.
fn locate(world: &World, occupant: Occupant) -> Option<Position> {
    match occupant {
        Occupant::Source(id) => world.source(id).map(TrashSource::position),
        Occupant::Collector(id) => world.collector(id).map(Collector::position),
        Occupant::Sink => Some(world.sink().position()),
    }
}

/// Grid records whose cell disagrees with the agent's own position.
fn stale_records<F>(grid: &Grid, position_of: F) -> Vec<InvariantViolation>
where
    F: Fn(Occupant) -> Option<Position>,
{
    grid.iter_occupants()
        .filter_map(|(recorded, occupant)| {
            let actual = position_of(occupant);
            (actual != Some(recorded)).then_some(InvariantViolation::StaleGridRecord {
                occupant,
                recorded,
                actual,
            })
        })
        .collect()
}

fn check_conservation(world: &World, out: &mut Vec<InvariantViolation>) {
    let generated = metrics::total_generated(world.sources());
    let held = world
        .holdings()
        .values()
        .copied()
        .fold(Decimal::ZERO, Decimal::saturating_add);
    if generated != held {
        out.push(InvariantViolation::ConservationBroken {
            generated,
            accounted: held,
        });
    }

    let reconciled = world.ledger().reconcile(world.tick(), &world.holdings());
    if let ConservationResult::Anomaly(anomaly) = reconciled {
        out.push(InvariantViolation::LedgerMismatch {
            message: anomaly.message,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wasteflow_types::Topology;

    use super::*;
    use crate::config::SimulationConfig;

    #[test]
    fn fresh_worlds_are_clean_across_seeds() {
        for seed in 0..20 {
            let mut config = SimulationConfig::default();
            config.world.seed = seed;
            let world = World::new(&config).unwrap();
            assert_eq!(audit(&world), Vec::new(), "seed {seed}");
        }
    }

    #[test]
    fn bounded_world_stays_clean_while_running() {
        let mut config = SimulationConfig::default();
        config.world.topology = Topology::Bounded;
        config.world.width = 8;
        config.world.height = 8;
        let mut world = World::new(&config).unwrap();
        for _ in 0..200 {
            world.advance();
            let violations = audit(&world);
            assert!(violations.is_empty(), "tick {}: {violations:?}", world.tick());
        }
    }

    #[test]
    fn grid_records_must_match_agent_positions() {
        let mut grid = Grid::new(4, 4, Topology::Bounded).unwrap();
        let building = Occupant::Source(SourceId::new(0));
        let ghost = Occupant::Collector(CollectorId::new(3));
        grid.place(building, Position::new(1, 1)).unwrap();
        grid.place(ghost, Position::new(2, 2)).unwrap();
        grid.place(Occupant::Sink, Position::ORIGIN).unwrap();

        let stale = stale_records(&grid, |occupant| match occupant {
            Occupant::Source(_) => Some(Position::new(3, 3)),
            Occupant::Collector(_) => None,
            Occupant::Sink => Some(Position::ORIGIN),
        });
        assert_eq!(
            stale,
            vec![
                InvariantViolation::StaleGridRecord {
                    occupant: building,
                    recorded: Position::new(1, 1),
                    actual: Some(Position::new(3, 3)),
                },
                InvariantViolation::StaleGridRecord {
                    occupant: ghost,
                    recorded: Position::new(2, 2),
                    actual: None,
                },
            ]
        );
    }

    #[test]
    fn violations_render_readably() {
        let v = InvariantViolation::DuplicateTarget {
            source_id: SourceId::new(2),
            first: CollectorId::new(0),
            second: CollectorId::new(1),
        };
        assert_eq!(v.to_string(), "building-2 is targeted by both truck-0 and truck-1");
    }
}
