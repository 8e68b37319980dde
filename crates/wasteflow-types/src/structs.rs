//! Report and view structures consumed outside the coordination core.
//!
//! A renderer reads [`AgentView`] values, a chart reads [`WorldReport`]
//! values, and the ledger stores [`FlowEntry`] values. None of these feed
//! back into dispatch decisions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AgentKind, CollectorPhase, FlowKind, FlowParty, Occupant};
use crate::position::Position;

// ---------------------------------------------------------------------------
// Render view
// ---------------------------------------------------------------------------

/// Everything a renderer needs to draw one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentView {
    /// Which agent this is.
    pub occupant: Occupant,
    /// Agent kind tag.
    pub kind: AgentKind,
    /// Current cell.
    pub position: Position,
    /// Fill level (buildings), current load (trucks) or total received
    /// (disposal).
    #[ts(as = "String")]
    pub amount: Decimal,
    /// `amount / capacity`, in `[0, 1]`. Always zero for the disposal site.
    #[ts(as = "String")]
    pub fill_ratio: Decimal,
    /// Dispatch phase, for trucks only.
    pub phase: Option<CollectorPhase>,
    /// Whether a building is waiting for pickup.
    pub pickup_requested: bool,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Number of collectors in each dispatch phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PhaseCounts {
    /// Collectors looking for work.
    pub patrolling: u32,
    /// Collectors holding a claim.
    pub collecting: u32,
    /// Collectors driving to the disposal site.
    pub returning: u32,
}

impl PhaseCounts {
    /// Count one collector in `phase`.
    pub const fn record(&mut self, phase: CollectorPhase) {
        match phase {
            CollectorPhase::Patrolling => self.patrolling = self.patrolling.saturating_add(1),
            CollectorPhase::Collecting => self.collecting = self.collecting.saturating_add(1),
            CollectorPhase::Returning => self.returning = self.returning.saturating_add(1),
        }
    }
}

/// Per-tick aggregate reporters. Every field is a pure function of world
/// state at the end of the tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldReport {
    /// The tick this report describes.
    pub tick: u64,
    /// Trash generated by all buildings since the start of the run.
    #[ts(as = "String")]
    pub total_generated: Decimal,
    /// Trash harvested by all trucks since the start of the run.
    #[ts(as = "String")]
    pub total_collected: Decimal,
    /// Trash delivered to the disposal site since the start of the run.
    #[ts(as = "String")]
    pub total_received: Decimal,
    /// Mean `wait_ticks` over buildings awaiting pickup (zero if none).
    #[ts(as = "String")]
    pub mean_wait_ticks: Decimal,
    /// Number of buildings awaiting pickup.
    pub buildings_needing_pickup: u32,
    /// Disposal trips completed by all trucks.
    pub trips_made: u64,
    /// Cells moved by all trucks.
    pub distance_traveled: u64,
    /// Trucks per dispatch phase.
    pub phases: PhaseCounts,
}

// ---------------------------------------------------------------------------
// Ledger entry
// ---------------------------------------------------------------------------

/// One double-entry record of trash moving between two parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FlowEntry {
    /// Tick in which the transfer happened.
    pub tick: u64,
    /// Transfer category.
    pub kind: FlowKind,
    /// Debited party.
    pub from: FlowParty,
    /// Credited party.
    pub to: FlowParty,
    /// Amount moved; always strictly positive.
    #[ts(as = "String")]
    pub quantity: Decimal,
}
