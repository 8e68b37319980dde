//! Shared type definitions for the Wasteflow simulation.
//!
//! This crate is the single source of truth for the identifiers, grid
//! coordinates, enumerations and report structures used across the
//! workspace. Types defined here flow downstream to `TypeScript` via
//! `ts-rs` so an external renderer can consume per-tick state.
//!
//! # Modules
//!
//! - [`ids`] -- Index-backed identifiers for buildings and trucks
//! - [`position`] -- Grid cell coordinates and Manhattan distance
//! - [`enums`] -- Agent kinds, state-machine phases, occupants, flow kinds
//! - [`structs`] -- Render views, world reports and ledger entries

pub mod enums;
pub mod ids;
pub mod position;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentKind, CollectorPhase, FlowKind, FlowParty, Occupant, SourceStatus, Topology};
pub use ids::{CollectorId, SourceId};
pub use position::Position;
pub use structs::{AgentView, FlowEntry, PhaseCounts, WorldReport};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings when `export_all` is invoked. Files land
        // in `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::SourceId::export_all();
        let _ = crate::ids::CollectorId::export_all();
        let _ = crate::position::Position::export_all();

        // Enums
        let _ = crate::enums::AgentKind::export_all();
        let _ = crate::enums::CollectorPhase::export_all();
        let _ = crate::enums::SourceStatus::export_all();
        let _ = crate::enums::Topology::export_all();
        let _ = crate::enums::Occupant::export_all();
        let _ = crate::enums::FlowKind::export_all();
        let _ = crate::enums::FlowParty::export_all();

        // Structs
        let _ = crate::structs::AgentView::export_all();
        let _ = crate::structs::PhaseCounts::export_all();
        let _ = crate::structs::WorldReport::export_all();
        let _ = crate::structs::FlowEntry::export_all();
    }
}
