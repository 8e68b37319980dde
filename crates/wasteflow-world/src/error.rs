//! Error types for the `wasteflow-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`]. None of
//! these are raised while stepping: a blocked move inside the tick loop is
//! an ordinary branch, and the caller checks the destination before
//! asking the grid to relocate.

use wasteflow_types::{Occupant, Position};

/// Errors that can occur during grid and agent operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid was requested with a zero dimension.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The grid has more cells than this platform can index.
    #[error("grid {width}x{height} is too large to allocate")]
    GridTooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A position lies outside the grid.
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    /// The occupant was expected at a cell but is not there.
    #[error("{occupant} is not at {position}")]
    NotAtCell {
        /// The occupant being moved.
        occupant: Occupant,
        /// The cell it was expected in.
        position: Position,
    },

    /// The occupant is already present in the cell.
    #[error("{occupant} is already at {position}")]
    AlreadyAtCell {
        /// The occupant being placed.
        occupant: Occupant,
        /// The cell it already occupies.
        position: Position,
    },

    /// No empty cell remains for placement or displacement.
    #[error("no empty cell available on the grid")]
    NoEmptyCell,

    /// A trash source was configured with invalid parameters.
    #[error("invalid trash source: {reason}")]
    InvalidSource {
        /// Explanation of what is wrong.
        reason: String,
    },
}
