//! Enumeration types for the Wasteflow simulation.
//!
//! Agent kinds are modelled as tagged variants rather than runtime type
//! checks: grid scans and reporters filter on these tags.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{CollectorId, SourceId};

// ---------------------------------------------------------------------------
// Agent kinds
// ---------------------------------------------------------------------------

/// The kind of an agent placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AgentKind {
    /// A building that generates trash.
    Building,
    /// A collection truck.
    Truck,
    /// The disposal site.
    Disposal,
}

/// A grid occupant: which agent sits in a cell.
///
/// Ordering is by kind first, then by registration index, which gives a
/// stable iteration order for cell contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Occupant {
    /// A trash source.
    Source(SourceId),
    /// A collector.
    Collector(CollectorId),
    /// The disposal sink (there is exactly one).
    Sink,
}

impl Occupant {
    /// Return the agent kind for this occupant.
    pub const fn kind(self) -> AgentKind {
        match self {
            Self::Source(_) => AgentKind::Building,
            Self::Collector(_) => AgentKind::Truck,
            Self::Sink => AgentKind::Disposal,
        }
    }

    /// Whether this occupant is a collector.
    pub const fn is_collector(self) -> bool {
        matches!(self, Self::Collector(_))
    }
}

impl core::fmt::Display for Occupant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Source(id) => write!(f, "{id}"),
            Self::Collector(id) => write!(f, "{id}"),
            Self::Sink => write!(f, "disposal"),
        }
    }
}

// ---------------------------------------------------------------------------
// State machines
// ---------------------------------------------------------------------------

/// Request state of a trash source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SourceStatus {
    /// Filling; no pickup requested.
    Idle,
    /// Fill crossed the threshold; waiting for a truck.
    AwaitingPickup,
}

/// Dispatch phase of a collector, without the claim payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CollectorPhase {
    /// Looking for unclaimed pickup requests, wandering otherwise.
    Patrolling,
    /// Driving to (or harvesting) a claimed source.
    Collecting,
    /// Driving to the disposal site to unload.
    Returning,
}

impl core::fmt::Display for CollectorPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Patrolling => "patrolling",
            Self::Collecting => "collecting",
            Self::Returning => "returning",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// How the grid edges behave for neighborhood queries.
///
/// Navigation steps toward a target never wrap; only the undirected patrol
/// walk sees wrapped neighbors on a toroidal grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Topology {
    /// Edges wrap around.
    #[default]
    Toroidal,
    /// Edges are walls.
    Bounded,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The category of a trash transfer recorded in the ledger.
///
/// | Kind | From (debit) | To (credit) |
/// |------|-------------|-------------|
/// | Generation | World | Source |
/// | Harvest | Source | Collector |
/// | Deposit | Collector | Sink |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FlowKind {
    /// Trash created inside a building.
    Generation,
    /// A truck empties a building.
    Harvest,
    /// A truck unloads at the disposal site.
    Deposit,
}

/// A party on one side of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FlowParty {
    /// Outside the simulation; the origin of all generated trash.
    World,
    /// A trash source.
    Source(SourceId),
    /// A collector.
    Collector(CollectorId),
    /// The disposal sink.
    Sink,
}

impl FlowParty {
    /// Short label used in anomaly messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Source(_) => "source",
            Self::Collector(_) => "collector",
            Self::Sink => "sink",
        }
    }
}
