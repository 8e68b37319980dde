//! Grid, trash sources, and the disposal site for the Wasteflow simulation.
//!
//! This crate models the passive side of the world: the occupancy grid that
//! trucks move across, the buildings that fill up with trash and raise
//! pickup requests, and the disposal site that absorbs delivered loads.
//! Nothing here makes dispatch decisions.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid placement and agent construction.
//! - [`grid`] -- [`Grid`]: an arena of cells indexed by coordinate, each
//!   holding a small set of occupants, with atomic relocation.
//! - [`source`] -- [`TrashSource`]: per-tick generation with the pickup
//!   request latch and the atomic `harvest` transfer.
//! - [`sink`] -- [`DisposalSink`]: the unbounded `deposit` target.

pub mod error;
pub mod grid;
pub mod sink;
pub mod source;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::Grid;
pub use sink::DisposalSink;
pub use source::{GenerationOutcome, SourceParams, TrashSource};
