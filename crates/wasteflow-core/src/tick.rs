//! Per-tick results.
//!
//! One [`TickSummary`] comes out of every [`World::advance`]. It describes
//! what changed during the tick; the accompanying [`WorldReport`] describes
//! the state at the end of it.
//!
//! [`World::advance`]: crate::world::World::advance

use rust_decimal::Decimal;
use wasteflow_agents::CollectorEvent;
use wasteflow_ledger::LedgerAnomaly;
use wasteflow_types::{SourceId, WorldReport};

/// Summary of a completed tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick that just completed.
    pub tick: u64,
    /// Trash generated by all buildings this tick.
    pub generated: Decimal,
    /// Buildings whose pickup request latched this tick.
    pub requests_raised: Vec<SourceId>,
    /// Collector events in the order they happened.
    pub events: Vec<CollectorEvent>,
    /// Number of ledger entries closed this tick.
    pub flow_entries: usize,
    /// Conservation problems detected at the end of the tick.
    pub anomalies: Vec<LedgerAnomaly>,
    /// Aggregates at the end of the tick.
    pub report: WorldReport,
}

impl TickSummary {
    /// Trash harvested from buildings this tick.
    pub fn harvested(&self) -> Decimal {
        self.events
            .iter()
            .filter_map(|e| match e {
                CollectorEvent::Harvested { amount, .. } => Some(*amount),
                _ => None,
            })
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Trash delivered to the disposal site this tick.
    pub fn deposited(&self) -> Decimal {
        self.events
            .iter()
            .filter_map(|e| match e {
                CollectorEvent::Deposited { amount, .. } => Some(*amount),
                _ => None,
            })
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Number of claims made this tick.
    pub fn claims_made(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CollectorEvent::Claimed { .. }))
            .count()
    }

    /// Whether the ledger balanced at the end of the tick.
    pub fn is_balanced(&self) -> bool {
        self.anomalies.is_empty()
    }
}
