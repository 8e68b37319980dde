//! The collector (garbage truck) state machine.
//!
//! Each truck is in exactly one of three states:
//!
//! ```text
//!            claim nearest fitting request
//!   Patrolling ----------------------------> Collecting{target}
//!      ^  |                                      |      |
//!      |  | requests exist, none fit, load > 0   |      | request vanished
//!      |  v                                      |      v
//!      | Returning <---- harvest, now full ------+   Patrolling
//!      |    |                                    |
//!      +----+ deposit at sink                    +--> Patrolling (room left)
//! ```
//!
//! A truck advances `speed` sub-steps per tick; each sub-step runs one
//! state's logic (a single cell of movement or one arrival action), so a
//! speed-2 truck may arrive and harvest within the same tick.
//!
//! The target of a collecting truck lives inside [`CollectorState`], so a
//! truck cannot hold a target without collecting.

use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use wasteflow_ledger::Ledger;
use wasteflow_types::{CollectorId, CollectorPhase, Occupant, Position, SourceId};
use wasteflow_world::{DisposalSink, Grid, TrashSource, WorldError};

use crate::claims::ClaimRegistry;
use crate::dispatch::{self, Dispatch};
use crate::error::AgentError;
use crate::navigation;

/// Construction parameters for a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorParams {
    /// Maximum load. Must be positive.
    pub capacity: Decimal,
    /// Sub-steps per tick. Must be at least 1.
    pub speed: u32,
}

/// Behavioral state of a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Looking for a pickup request; random-walks when there is none.
    Patrolling,
    /// Driving to, and then harvesting, a claimed source.
    Collecting {
        /// The claimed source.
        target: SourceId,
    },
    /// Driving to the disposal site to unload.
    Returning,
}

impl CollectorState {
    /// The reportable phase.
    pub const fn phase(self) -> CollectorPhase {
        match self {
            Self::Patrolling => CollectorPhase::Patrolling,
            Self::Collecting { .. } => CollectorPhase::Collecting,
            Self::Returning => CollectorPhase::Returning,
        }
    }

    /// The claimed source while collecting.
    pub const fn target(self) -> Option<SourceId> {
        match self {
            Self::Collecting { target } => Some(target),
            Self::Patrolling | Self::Returning => None,
        }
    }
}

/// Something a collector did that the tick summary cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorEvent {
    /// A request was claimed.
    Claimed {
        /// The truck.
        collector: CollectorId,
        /// The claimed building.
        source: SourceId,
        /// Manhattan distance when claimed.
        distance: u64,
    },
    /// A claimed request disappeared before arrival.
    Abandoned {
        /// The truck.
        collector: CollectorId,
        /// The building whose request vanished.
        source: SourceId,
    },
    /// A building was emptied into the truck.
    Harvested {
        /// The truck.
        collector: CollectorId,
        /// The emptied building.
        source: SourceId,
        /// Trash moved.
        amount: Decimal,
    },
    /// The truck headed home with a partial or full load.
    StartedReturn {
        /// The truck.
        collector: CollectorId,
        /// Load carried.
        load: Decimal,
    },
    /// A load was unloaded at the disposal site.
    Deposited {
        /// The truck.
        collector: CollectorId,
        /// Trash delivered.
        amount: Decimal,
    },
}

/// Everything a collector touches during its turn.
///
/// Built once per tick by the world and handed to each collector in id
/// order; claims made by one collector are visible to the next.
pub struct StepContext<'a, R: Rng + ?Sized> {
    /// Current tick, stamped on ledger entries.
    pub tick: u64,
    /// Shared occupancy grid.
    pub grid: &'a mut Grid,
    /// All sources, indexed by [`SourceId::slot`].
    pub sources: &'a mut [TrashSource],
    /// The disposal site.
    pub sink: &'a mut DisposalSink,
    /// Shared claim registry.
    pub claims: &'a mut ClaimRegistry,
    /// Trash-flow ledger.
    pub ledger: &'a mut Ledger,
    /// The world's random number generator.
    pub rng: &'a mut R,
    /// Collected events, appended in the order they happen.
    pub events: &'a mut Vec<CollectorEvent>,
}

/// A garbage truck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collector {
    id: CollectorId,
    position: Position,
    capacity: Decimal,
    speed: u32,
    load: Decimal,
    state: CollectorState,
    total_collected: Decimal,
    trips_made: u64,
    distance_traveled: u64,
}

impl Collector {
    /// Create an empty, patrolling collector.
    ///
    /// The collector is not placed on any grid; the caller records it with
    /// [`Grid::place`] at the same position.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidCollector`] if capacity is not positive
    /// or speed is zero.
    pub fn new(id: CollectorId, position: Position, params: CollectorParams) -> Result<Self, AgentError> {
        if params.capacity <= Decimal::ZERO {
            return Err(AgentError::InvalidCollector {
                reason: format!("capacity must be positive, got {}", params.capacity),
            });
        }
        if params.speed == 0 {
            return Err(AgentError::InvalidCollector {
                reason: "speed must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            id,
            position,
            capacity: params.capacity,
            speed: params.speed,
            load: Decimal::ZERO,
            state: CollectorState::Patrolling,
            total_collected: Decimal::ZERO,
            trips_made: 0,
            distance_traveled: 0,
        })
    }

    /// Run one tick: `speed` sub-steps of the state machine.
    pub fn step<R: Rng + ?Sized>(&mut self, ctx: &mut StepContext<'_, R>) {
        for _ in 0..self.speed {
            self.substep(ctx);
        }
    }

    /// Run a single sub-step of the current state.
    pub fn substep<R: Rng + ?Sized>(&mut self, ctx: &mut StepContext<'_, R>) {
        match self.state {
            CollectorState::Patrolling => self.patrol(ctx),
            CollectorState::Collecting { target } => self.collect(target, ctx),
            CollectorState::Returning => self.return_to_sink(ctx),
        }
    }

    fn patrol<R: Rng + ?Sized>(&mut self, ctx: &mut StepContext<'_, R>) {
        let headroom = self.capacity.saturating_sub(self.load);
        match dispatch::select_target(self.id, self.position, headroom, ctx.sources, ctx.claims) {
            Dispatch::Claim { source, distance } => {
                if let Err(e) = ctx.claims.claim(source, self.id) {
                    warn!(collector = %self.id, error = %e, "Claim refused during dispatch");
                    self.wander(ctx);
                    return;
                }
                debug!(collector = %self.id, %source, distance, "Claimed pickup");
                self.state = CollectorState::Collecting { target: source };
                ctx.events.push(CollectorEvent::Claimed {
                    collector: self.id,
                    source,
                    distance,
                });
            }
            Dispatch::NoFit if self.load > Decimal::ZERO => {
                debug!(collector = %self.id, load = %self.load, "No request fits, returning to unload");
                self.start_return(ctx);
            }
            Dispatch::NoFit | Dispatch::Idle => self.wander(ctx),
        }
    }

    fn collect<R: Rng + ?Sized>(&mut self, target: SourceId, ctx: &mut StepContext<'_, R>) {
        let lookup = ctx
            .sources
            .get(target.slot())
            .filter(|s| s.id() == target)
            .map(|s| (s.pickup_requested(), s.position()));
        let still_ours = ctx.claims.holder(target) == Some(self.id);

        let dest = match lookup {
            Some((true, dest)) if still_ours => dest,
            _ => {
                debug!(collector = %self.id, source = %target, "Request vanished, abandoning claim");
                ctx.claims.release(target, self.id);
                self.state = CollectorState::Patrolling;
                ctx.events.push(CollectorEvent::Abandoned {
                    collector: self.id,
                    source: target,
                });
                return;
            }
        };

        if self.position != dest {
            self.drive_towards(dest, ctx);
            return;
        }

        let Some(source) = ctx.sources.get_mut(target.slot()) else {
            return;
        };
        let amount = source.harvest();
        ctx.claims.release(target, self.id);
        if amount > Decimal::ZERO
            && let Err(e) = ctx.ledger.record_harvest(ctx.tick, target, self.id, amount)
        {
            warn!(collector = %self.id, error = %e, "Failed to record harvest");
        }
        self.load = self.load.saturating_add(amount);
        self.total_collected = self.total_collected.saturating_add(amount);
        debug!(collector = %self.id, source = %target, %amount, load = %self.load, "Harvested");
        ctx.events.push(CollectorEvent::Harvested {
            collector: self.id,
            source: target,
            amount,
        });

        if self.load >= self.capacity {
            self.start_return(ctx);
        } else {
            self.state = CollectorState::Patrolling;
        }
    }

    fn return_to_sink<R: Rng + ?Sized>(&mut self, ctx: &mut StepContext<'_, R>) {
        let dest = ctx.sink.position();
        if self.position != dest {
            self.drive_towards(dest, ctx);
            return;
        }

        let amount = self.load;
        ctx.sink.deposit(amount);
        if amount > Decimal::ZERO
            && let Err(e) = ctx.ledger.record_deposit(ctx.tick, self.id, amount)
        {
            warn!(collector = %self.id, error = %e, "Failed to record deposit");
        }
        self.load = Decimal::ZERO;
        self.trips_made = self.trips_made.saturating_add(1);
        self.state = CollectorState::Patrolling;
        debug!(collector = %self.id, %amount, trips = self.trips_made, "Unloaded at disposal site");
        ctx.events.push(CollectorEvent::Deposited {
            collector: self.id,
            amount,
        });
    }

    fn start_return<R: Rng + ?Sized>(&mut self, ctx: &mut StepContext<'_, R>) {
        self.state = CollectorState::Returning;
        ctx.events.push(CollectorEvent::StartedReturn {
            collector: self.id,
            load: self.load,
        });
    }

    /// One directed step, or a random one if both axes are blocked.
    fn drive_towards<R: Rng + ?Sized>(&mut self, dest: Position, ctx: &mut StepContext<'_, R>) {
        match navigation::step_towards(ctx.grid, self.position, dest) {
            Some(next) => self.move_to(ctx.grid, next),
            None => self.wander(ctx),
        }
    }

    fn wander<R: Rng + ?Sized>(&mut self, ctx: &mut StepContext<'_, R>) {
        if let Some(next) = navigation::random_step(ctx.grid, self.position, ctx.rng) {
            self.move_to(ctx.grid, next);
        }
    }

    fn move_to(&mut self, grid: &mut Grid, next: Position) {
        match grid.relocate(self.occupant(), self.position, next) {
            Ok(()) => {
                self.position = next;
                self.distance_traveled = self.distance_traveled.saturating_add(1);
            }
            Err(e) => {
                warn!(collector = %self.id, error = %e, "Move rejected by grid");
            }
        }
    }

    /// Move this collector on `grid` without counting distance, updating
    /// its stored position only if the grid accepted the move.
    ///
    /// # Errors
    ///
    /// Propagates [`Grid::relocate`] failures; on error nothing changes.
    pub fn relocate(&mut self, grid: &mut Grid, to: Position) -> Result<(), WorldError> {
        grid.relocate(self.occupant(), self.position, to)?;
        self.position = to;
        Ok(())
    }

    /// Identifier.
    pub const fn id(&self) -> CollectorId {
        self.id
    }

    /// Grid tag for this collector.
    pub const fn occupant(&self) -> Occupant {
        Occupant::Collector(self.id)
    }

    /// Current cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Maximum load.
    pub const fn capacity(&self) -> Decimal {
        self.capacity
    }

    /// Sub-steps per tick.
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Trash currently carried.
    pub const fn load(&self) -> Decimal {
        self.load
    }

    /// Behavioral state.
    pub const fn state(&self) -> CollectorState {
        self.state
    }

    /// Reportable phase.
    pub const fn phase(&self) -> CollectorPhase {
        self.state.phase()
    }

    /// Claimed source while collecting.
    pub const fn target(&self) -> Option<SourceId> {
        self.state.target()
    }

    /// Trash harvested since the start of the run.
    pub const fn total_collected(&self) -> Decimal {
        self.total_collected
    }

    /// Completed unload trips.
    pub const fn trips_made(&self) -> u64 {
        self.trips_made
    }

    /// Cells moved since the start of the run.
    pub const fn distance_traveled(&self) -> u64 {
        self.distance_traveled
    }

    /// `load / capacity`, in `[0, 1]`.
    pub fn load_ratio(&self) -> Decimal {
        self.load
            .checked_div(self.capacity)
            .unwrap_or(Decimal::ZERO)
            .min(Decimal::ONE)
    }
}
