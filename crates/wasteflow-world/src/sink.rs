//! The disposal site.

use rust_decimal::Decimal;
use tracing::debug;
use wasteflow_types::{Occupant, Position};

/// Fixed-position sink that accepts any amount of trash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalSink {
    position: Position,
    total_received: Decimal,
    deliveries: u64,
}

impl DisposalSink {
    /// Create an empty sink at `position`.
    pub const fn new(position: Position) -> Self {
        Self {
            position,
            total_received: Decimal::ZERO,
            deliveries: 0,
        }
    }

    /// Accept a delivery. Negative amounts are ignored so the running total
    /// never decreases.
    pub fn deposit(&mut self, amount: Decimal) {
        if amount.is_sign_negative() {
            debug!(%amount, "Ignoring negative deposit");
            return;
        }
        self.total_received = self.total_received.saturating_add(amount);
        self.deliveries = self.deliveries.saturating_add(1);
    }

    /// Grid tag for the sink.
    pub const fn occupant(&self) -> Occupant {
        Occupant::Sink
    }

    /// The sink's cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Trash delivered since the start of the run.
    pub const fn total_received(&self) -> Decimal {
        self.total_received
    }

    /// Number of accepted deliveries.
    pub const fn deliveries(&self) -> u64 {
        self.deliveries
    }
}
