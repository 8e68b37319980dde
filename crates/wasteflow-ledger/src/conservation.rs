//! Conservation checks for the trash-flow ledger.
//!
//! Two checks run at the end of every tick:
//!
//! 1. [`verify_flows`] -- every entry of the tick has a positive quantity
//!    and the parties its kind allows. Each entry debits and credits the
//!    same amount, so a well-formed log balances by construction; this
//!    check guards against entries assembled outside [`Ledger`].
//! 2. [`reconcile`] -- the ledger's running balance for each party equals
//!    what that party actually holds, and the world's debit equals the sum
//!    of all holdings.
//!
//! A failure of either produces a [`LedgerAnomaly`].
//!
//! [`Ledger`]: crate::Ledger

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use wasteflow_types::{FlowEntry, FlowKind, FlowParty};

use crate::{LedgerAnomaly, LedgerError};

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Everything balances.
    Balanced,
    /// At least one party is out of balance.
    Anomaly(LedgerAnomaly),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Expected `(from, to)` party labels for a flow kind.
const fn expected_parties(kind: FlowKind) -> (&'static str, &'static str) {
    match kind {
        FlowKind::Generation => ("world", "source"),
        FlowKind::Harvest => ("source", "collector"),
        FlowKind::Deposit => ("collector", "sink"),
    }
}

/// Check that `from` and `to` are the parties `kind` allows.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidParty`] naming the offending side.
pub fn check_parties(kind: FlowKind, from: FlowParty, to: FlowParty) -> Result<(), LedgerError> {
    let (expected_from, expected_to) = expected_parties(kind);
    if from.label() != expected_from {
        return Err(LedgerError::InvalidParty {
            kind,
            side: "from",
            expected: expected_from,
            actual: from.label(),
        });
    }
    if to.label() != expected_to {
        return Err(LedgerError::InvalidParty {
            kind,
            side: "to",
            expected: expected_to,
            actual: to.label(),
        });
    }
    Ok(())
}

/// Verify every entry recorded for `tick`.
///
/// Entries from other ticks are ignored.
pub fn verify_flows(tick: u64, entries: &[FlowEntry]) -> ConservationResult {
    let mut imbalances: BTreeMap<FlowParty, (Decimal, Decimal)> = BTreeMap::new();
    let mut problems: Vec<String> = Vec::new();

    for entry in entries.iter().filter(|e| e.tick == tick) {
        if entry.quantity <= Decimal::ZERO {
            imbalances.insert(entry.from, (entry.quantity, Decimal::ZERO));
            problems.push(format!(
                "non-positive {:?} quantity {} from {:?}",
                entry.kind, entry.quantity, entry.from
            ));
        }
        if let Err(e) = check_parties(entry.kind, entry.from, entry.to) {
            imbalances.insert(entry.from, (entry.quantity, Decimal::ZERO));
            problems.push(e.to_string());
        }
    }

    if problems.is_empty() {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            tick,
            imbalances,
            message: format!(
                "LEDGER_ANOMALY at tick {tick}: {} malformed flow(s): {}",
                problems.len(),
                problems.join("; ")
            ),
        })
    }
}

/// Compare running balances against observed holdings.
///
/// Every party that appears in either map (other than the world) must have
/// the same value in both; a party missing from one side counts as zero.
/// Additionally the world's balance must be the exact negation of the sum
/// of all holdings.
pub fn reconcile(
    tick: u64,
    balances: &BTreeMap<FlowParty, Decimal>,
    holdings: &BTreeMap<FlowParty, Decimal>,
) -> ConservationResult {
    let parties: BTreeSet<FlowParty> = balances
        .keys()
        .chain(holdings.keys())
        .copied()
        .filter(|p| *p != FlowParty::World)
        .collect();

    let mut imbalances: BTreeMap<FlowParty, (Decimal, Decimal)> = BTreeMap::new();
    let mut held_total = Decimal::ZERO;

    for party in parties {
        let booked = balances.get(&party).copied().unwrap_or(Decimal::ZERO);
        let observed = holdings.get(&party).copied().unwrap_or(Decimal::ZERO);
        held_total = held_total.saturating_add(observed);
        if booked != observed {
            imbalances.insert(party, (booked, observed));
        }
    }

    let generated = balances
        .get(&FlowParty::World)
        .copied()
        .unwrap_or(Decimal::ZERO);
    if generated.saturating_add(held_total) != Decimal::ZERO {
        imbalances.insert(FlowParty::World, (generated, -held_total));
    }

    if imbalances.is_empty() {
        ConservationResult::Balanced
    } else {
        let count = imbalances.len();
        ConservationResult::Anomaly(LedgerAnomaly {
            tick,
            imbalances,
            message: format!(
                "LEDGER_ANOMALY at tick {tick}: holdings disagree with ledger for {count} party(ies)"
            ),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use wasteflow_types::{CollectorId, SourceId};

    use super::*;

    fn entry(tick: u64, kind: FlowKind, from: FlowParty, to: FlowParty, q: i64) -> FlowEntry {
        FlowEntry {
            tick,
            kind,
            from,
            to,
            quantity: Decimal::new(q, 0),
        }
    }

    #[test]
    fn well_formed_flows_balance() {
        let s = FlowParty::Source(SourceId::new(0));
        let c = FlowParty::Collector(CollectorId::new(0));
        let entries = vec![
            entry(1, FlowKind::Generation, FlowParty::World, s, 5),
            entry(1, FlowKind::Harvest, s, c, 5),
            entry(1, FlowKind::Deposit, c, FlowParty::Sink, 5),
        ];
        assert_eq!(verify_flows(1, &entries), ConservationResult::Balanced);
    }

    #[test]
    fn wrong_party_is_an_anomaly() {
        let c = FlowParty::Collector(CollectorId::new(0));
        let entries = vec![entry(2, FlowKind::Generation, FlowParty::World, c, 1)];
        let result = verify_flows(2, &entries);
        assert!(!result.is_balanced());
    }

    #[test]
    fn other_ticks_are_ignored() {
        let c = FlowParty::Collector(CollectorId::new(0));
        let entries = vec![entry(9, FlowKind::Generation, FlowParty::World, c, 1)];
        assert!(verify_flows(2, &entries).is_balanced());
    }

    #[test]
    fn check_parties_names_the_side() {
        let s = FlowParty::Source(SourceId::new(0));
        let err = check_parties(FlowKind::Deposit, s, FlowParty::Sink);
        assert!(matches!(
            err,
            Err(LedgerError::InvalidParty { side: "from", .. })
        ));
    }

    #[test]
    fn reconcile_flags_world_total_mismatch() {
        // The per-party holdings agree, but the world claims more was
        // generated than anyone holds.
        let s = FlowParty::Source(SourceId::new(0));
        let mut balances = BTreeMap::new();
        balances.insert(FlowParty::World, Decimal::new(-7, 0));
        balances.insert(s, Decimal::new(5, 0));
        let mut holdings = BTreeMap::new();
        holdings.insert(s, Decimal::new(5, 0));

        match reconcile(3, &balances, &holdings) {
            ConservationResult::Anomaly(a) => {
                assert!(a.imbalances.contains_key(&FlowParty::World));
                assert!(!a.imbalances.contains_key(&s));
            }
            ConservationResult::Balanced => panic!("expected world mismatch"),
        }
    }
}
