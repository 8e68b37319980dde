//! Double-entry trash-flow ledger for the Wasteflow simulation.
//!
//! Every unit of trash in the simulation is tracked through this ledger.
//! Trash enters only through generation inside a building and leaves the
//! roads only by being deposited at the disposal site. At the end of every
//! tick the ledger checks that the tick's flows are well-formed and that its
//! running balances agree with what each agent actually holds.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`Ledger`] struct: the current tick's entries plus
//!   running per-party balances.
//! - [`conservation`] -- Flow verification and balance reconciliation.
//!
//! # Conservation Law
//!
//! At every tick:
//!
//! ```text
//! sum(generated) == sink.received + sum(truck loads) + sum(building fills)
//! ```
//!
//! which is the same as saying that the world's (negative) balance plus the
//! balances of every source, collector and the sink sum to zero.
//!
//! | Kind | From (debit) | To (credit) |
//! |------|-------------|-------------|
//! | Generation | World | Source |
//! | Harvest | Source | Collector |
//! | Deposit | Collector | Sink |
//!
//! Entries are discarded once their tick is closed; only the running
//! balances survive, so memory use does not grow with run length.
//!
//! # Usage
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use rust_decimal::Decimal;
//! use wasteflow_ledger::{ConservationResult, Ledger};
//! use wasteflow_types::{CollectorId, FlowParty, SourceId};
//!
//! let mut ledger = Ledger::new();
//! let building = SourceId::new(0);
//! let truck = CollectorId::new(0);
//!
//! ledger.record_generation(1, building, Decimal::new(8, 0)).ok();
//! ledger.record_harvest(1, building, truck, Decimal::new(8, 0)).ok();
//!
//! let closed = ledger.close_tick(1);
//! assert_eq!(closed.result, ConservationResult::Balanced);
//!
//! let mut holdings = BTreeMap::new();
//! holdings.insert(FlowParty::Source(building), Decimal::ZERO);
//! holdings.insert(FlowParty::Collector(truck), Decimal::new(8, 0));
//! holdings.insert(FlowParty::Sink, Decimal::ZERO);
//! assert_eq!(ledger.reconcile(1, &holdings), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod ledger;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::{ClosedTick, Ledger};

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use wasteflow_types::{FlowKind, FlowParty};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Quantity must be strictly positive.
    #[error("ledger entry quantity must be non-zero")]
    ZeroQuantity,

    /// Quantity must not be negative.
    #[error("ledger entry quantity must be positive, got {quantity}")]
    NegativeQuantity {
        /// The invalid quantity.
        quantity: Decimal,
    },

    /// The from/to parties do not match the flow kind.
    #[error("invalid {side} party for {kind:?}: expected {expected}, got {actual}")]
    InvalidParty {
        /// The flow kind being validated.
        kind: FlowKind,
        /// Which side of the entry ("from" or "to").
        side: &'static str,
        /// The expected party label.
        expected: &'static str,
        /// The actual party label.
        actual: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation detected while closing or reconciling a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The tick where the anomaly was detected.
    pub tick: u64,
    /// Per-party mismatch: (`ledger_balance`, `observed`) for each party
    /// that did not agree.
    pub imbalances: BTreeMap<FlowParty, (Decimal, Decimal)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
