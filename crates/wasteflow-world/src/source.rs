//! Trash sources (buildings).
//!
//! A [`TrashSource`] fills at a fixed rate each tick, clamped at its
//! capacity, and raises a pickup request once its fill reaches the
//! threshold (80% of capacity by default). The request is a latch:
//!
//! ```text
//!   Idle --(fill >= threshold)--> AwaitingPickup --(harvest)--> Idle
//! ```
//!
//! While awaiting pickup, `wait_ticks` counts every tick, including the one
//! on which the request was raised. [`TrashSource::harvest`] is the only
//! external mutator: it hands over the whole fill in one go and resets the
//! latch and the wait counter.
//!
//! All quantities are [`Decimal`] so generated, collected and delivered
//! totals balance exactly.

use rust_decimal::Decimal;
use wasteflow_types::{Occupant, Position, SourceId, SourceStatus};

use crate::error::WorldError;
use crate::grid::Grid;

/// Construction parameters for a trash source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceParams {
    /// Maximum fill level. Must be positive.
    pub capacity: Decimal,
    /// Trash added per tick while below capacity. Must be positive.
    pub generation_rate: Decimal,
    /// Fill percentage (1--100) at which a pickup is requested.
    pub pickup_threshold_pct: u32,
}

impl SourceParams {
    /// Default request threshold: 80% of capacity.
    pub const DEFAULT_THRESHOLD_PCT: u32 = 80;

    /// Parameters with the default 80% threshold.
    pub const fn new(capacity: Decimal, generation_rate: Decimal) -> Self {
        Self {
            capacity,
            generation_rate,
            pickup_threshold_pct: Self::DEFAULT_THRESHOLD_PCT,
        }
    }
}

/// What one tick of generation did to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Trash actually added this tick (zero once the source is full).
    pub generated: Decimal,
    /// Whether the pickup request latched on this tick.
    pub request_raised: bool,
}

/// A building that generates trash and requests pickup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashSource {
    id: SourceId,
    position: Position,
    capacity: Decimal,
    generation_rate: Decimal,
    /// Absolute fill level at which the request latches.
    pickup_threshold: Decimal,
    fill_level: Decimal,
    status: SourceStatus,
    wait_ticks: u64,
    total_generated: Decimal,
}

impl TrashSource {
    /// Create an empty, idle source.
    ///
    /// The source is not placed on any grid; the caller records it with
    /// [`Grid::place`] at the same position.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidSource`] if capacity or rate is not
    /// positive, or the threshold percentage is outside `1..=100`.
    pub fn new(id: SourceId, position: Position, params: &SourceParams) -> Result<Self, WorldError> {
        if params.capacity <= Decimal::ZERO {
            return Err(WorldError::InvalidSource {
                reason: format!("capacity must be positive, got {}", params.capacity),
            });
        }
        if params.generation_rate <= Decimal::ZERO {
            return Err(WorldError::InvalidSource {
                reason: format!(
                    "generation rate must be positive, got {}",
                    params.generation_rate
                ),
            });
        }
        if params.pickup_threshold_pct == 0 || params.pickup_threshold_pct > 100 {
            return Err(WorldError::InvalidSource {
                reason: format!(
                    "pickup threshold must be within 1..=100 percent, got {}",
                    params.pickup_threshold_pct
                ),
            });
        }

        let pickup_threshold = params
            .capacity
            .saturating_mul(Decimal::from(params.pickup_threshold_pct))
            .checked_div(Decimal::ONE_HUNDRED)
            .unwrap_or(params.capacity);

        Ok(Self {
            id,
            position,
            capacity: params.capacity,
            generation_rate: params.generation_rate,
            pickup_threshold,
            fill_level: Decimal::ZERO,
            status: SourceStatus::Idle,
            wait_ticks: 0,
            total_generated: Decimal::ZERO,
        })
    }

    /// Run one tick of generation and request bookkeeping.
    pub fn step(&mut self) -> GenerationOutcome {
        let mut generated = Decimal::ZERO;
        if self.fill_level < self.capacity {
            let headroom = self.capacity.saturating_sub(self.fill_level);
            generated = self.generation_rate.min(headroom);
            self.fill_level = self.fill_level.saturating_add(generated);
            self.total_generated = self.total_generated.saturating_add(generated);
        }

        let request_raised =
            self.status == SourceStatus::Idle && self.fill_level >= self.pickup_threshold;
        if request_raised {
            self.status = SourceStatus::AwaitingPickup;
            self.wait_ticks = 0;
        }

        if self.status == SourceStatus::AwaitingPickup {
            self.wait_ticks = self.wait_ticks.saturating_add(1);
        }

        GenerationOutcome {
            generated,
            request_raised,
        }
    }

    /// Hand over the entire fill, clearing the request latch.
    ///
    /// Returns the amount removed. There is no partial harvest.
    pub fn harvest(&mut self) -> Decimal {
        let collected = self.fill_level;
        self.fill_level = Decimal::ZERO;
        self.status = SourceStatus::Idle;
        self.wait_ticks = 0;
        collected
    }

    /// Move this source on `grid`, updating its stored position only if the
    /// grid accepted the move.
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
    pub const fn id(&self) -> SourceId {
        self.id
    }

    /// Grid tag for this source.
    pub const fn occupant(&self) -> Occupant {
        Occupant::Source(self.id)
    }

    /// Current cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Maximum fill level.
    pub const fn capacity(&self) -> Decimal {
        self.capacity
    }

    /// Trash added per tick while below capacity.
    pub const fn generation_rate(&self) -> Decimal {
        self.generation_rate
    }

    /// Fill level at which the request latches.
    pub const fn pickup_threshold(&self) -> Decimal {
        self.pickup_threshold
    }

    /// Current fill level.
    pub const fn fill_level(&self) -> Decimal {
        self.fill_level
    }

    /// Request state.
    pub const fn status(&self) -> SourceStatus {
        self.status
    }

    /// Whether a pickup is pending.
    pub fn pickup_requested(&self) -> bool {
        self.status == SourceStatus::AwaitingPickup
    }

    /// Ticks spent awaiting pickup (zero when idle).
    pub const fn wait_ticks(&self) -> u64 {
        self.wait_ticks
    }

    /// Trash generated since the start of the run.
    pub const fn total_generated(&self) -> Decimal {
        self.total_generated
    }

    /// `fill_level / capacity`, in `[0, 1]`.
    pub fn fill_ratio(&self) -> Decimal {
        self.fill_level
            .checked_div(self.capacity)
            .unwrap_or(Decimal::ZERO)
            .min(Decimal::ONE)
    }
}
