//! The trash-flow ledger.
//!
//! The [`Ledger`] holds the entries recorded during the current tick and a
//! running balance for every party that has ever sent or received trash.
//!
//! # Design
//!
//! - **Double-entry**: every transfer debits one party and credits another.
//! - **Tick-scoped log**: [`Ledger::close_tick`] verifies and hands back the
//!   tick's entries, then forgets them. Balances are the only history kept.
//! - **Precision**: all quantities use [`Decimal`] -- no floating point.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use wasteflow_types::{CollectorId, FlowEntry, FlowKind, FlowParty, SourceId};

use crate::LedgerError;
use crate::conservation::{self, ConservationResult};

/// The entries of one closed tick together with their verification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedTick {
    /// The tick that was closed.
    pub tick: u64,
    /// Entries recorded during the tick, in recording order.
    pub entries: Vec<FlowEntry>,
    /// Outcome of the flow verification for this tick.
    pub result: ConservationResult,
}

/// Running record of trash transfers.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Entries recorded since the last [`Ledger::close_tick`].
    pending: Vec<FlowEntry>,
    /// Net balance per party (credits minus debits).
    balances: BTreeMap<FlowParty, Decimal>,
    /// Total entries recorded since the start of the run.
    recorded: u64,
}

impl Ledger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            balances: BTreeMap::new(),
            recorded: 0,
        }
    }

    /// Record trash generated inside a building (world to source).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the quantity is not strictly positive.
    pub fn record_generation(
        &mut self,
        tick: u64,
        source: SourceId,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        self.record(
            tick,
            FlowKind::Generation,
            FlowParty::World,
            FlowParty::Source(source),
            quantity,
        )
    }

    /// Record a truck emptying a building (source to collector).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the quantity is not strictly positive.
    pub fn record_harvest(
        &mut self,
        tick: u64,
        source: SourceId,
        collector: CollectorId,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        self.record(
            tick,
            FlowKind::Harvest,
            FlowParty::Source(source),
            FlowParty::Collector(collector),
            quantity,
        )
    }

    /// Record a truck unloading at the disposal site (collector to sink).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the quantity is not strictly positive.
    pub fn record_deposit(
        &mut self,
        tick: u64,
        collector: CollectorId,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        self.record(
            tick,
            FlowKind::Deposit,
            FlowParty::Collector(collector),
            FlowParty::Sink,
            quantity,
        )
    }

    fn record(
        &mut self,
        tick: u64,
        kind: FlowKind,
        from: FlowParty,
        to: FlowParty,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        if quantity.is_zero() {
            return Err(LedgerError::ZeroQuantity);
        }
        if quantity.is_sign_negative() {
            return Err(LedgerError::NegativeQuantity { quantity });
        }
        conservation::check_parties(kind, from, to)?;

        let debit = self.balances.entry(from).or_insert(Decimal::ZERO);
        *debit = debit.saturating_sub(quantity);
        let credit = self.balances.entry(to).or_insert(Decimal::ZERO);
        *credit = credit.saturating_add(quantity);

        self.pending.push(FlowEntry {
            tick,
            kind,
            from,
            to,
            quantity,
        });
        self.recorded = self.recorded.saturating_add(1);
        Ok(())
    }

    /// Verify the pending entries for `tick` and hand them back, clearing
    /// the pending log.
    pub fn close_tick(&mut self, tick: u64) -> ClosedTick {
        let entries = core::mem::take(&mut self.pending);
        let result = conservation::verify_flows(tick, &entries);
        ClosedTick {
            tick,
            entries,
            result,
        }
    }

    /// Compare running balances against observed holdings.
    ///
    /// `holdings` maps every source, collector and the sink to the trash it
    /// currently holds (the sink's holding is its total received).
    pub fn reconcile(
        &self,
        tick: u64,
        holdings: &BTreeMap<FlowParty, Decimal>,
    ) -> ConservationResult {
        conservation::reconcile(tick, &self.balances, holdings)
    }

    /// Net balance of a party (zero if it never appeared).
    pub fn balance(&self, party: FlowParty) -> Decimal {
        self.balances.get(&party).copied().unwrap_or(Decimal::ZERO)
    }

    /// Total trash that has entered the simulation.
    pub fn total_generated(&self) -> Decimal {
        Decimal::ZERO.saturating_sub(self.balance(FlowParty::World))
    }

    /// Entries recorded but not yet closed.
    pub fn pending(&self) -> &[FlowEntry] {
        &self.pending
    }

    /// Number of entries recorded since the start of the run.
    pub const fn recorded(&self) -> u64 {
        self.recorded
    }
}
