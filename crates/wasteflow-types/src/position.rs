//! Grid cell coordinates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A cell on the simulation grid. `(0, 0)` is the disposal corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column, `0..width`.
    pub x: u32,
    /// Row, `0..height`.
    pub y: u32,
}

impl Position {
    /// The fixed corner cell where the disposal site lives.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a position from its coordinates.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell, ignoring any grid wrap.
    pub fn manhattan_distance(self, other: Self) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx.saturating_add(dy)
    }

    /// Signed per-axis deltas from `self` to `other`.
    pub fn delta_to(self, other: Self) -> (i64, i64) {
        let dx = i64::from(other.x).saturating_sub(i64::from(self.x));
        let dy = i64::from(other.y).saturating_sub(i64::from(self.y));
        (dx, dy)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u32, u32)> for Position {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}
