//! Movement rules.
//!
//! Goal-directed travel reduces one coordinate difference by one cell per
//! step. The axis with the larger absolute difference is tried first; on a
//! tie the y axis goes first. Directed steps never wrap, even on a toroidal
//! grid, so trucks always travel the straight Manhattan route.
//!
//! A step into a cell holding another collector is refused unless that cell
//! is the destination itself. When both axis steps are refused the truck
//! falls back to one [`random_step`], which is also how idle trucks patrol.

use rand::Rng;
use wasteflow_types::Position;
use wasteflow_world::Grid;

/// The next cell on the way from `from` to `dest`, or `None` if the truck is
/// already there or both axis steps are blocked.
pub fn step_towards(grid: &Grid, from: Position, dest: Position) -> Option<Position> {
    let (dx, dy) = from.delta_to(dest);
    let x_step = (dx.signum(), 0_i64);
    let y_step = (0_i64, dy.signum());
    let order = if dx.unsigned_abs() > dy.unsigned_abs() {
        [x_step, y_step]
    } else {
        [y_step, x_step]
    };

    for (sx, sy) in order {
        if sx == 0 && sy == 0 {
            continue;
        }
        if let Some(cell) = grid.offset(from, sx, sy)
            && (cell == dest || !grid.has_collector_at(cell))
        {
            return Some(cell);
        }
    }
    None
}

/// A uniformly random neighbor of `from` free of other collectors, or `None`
/// if every neighbor is taken. Wraps on a toroidal grid.
pub fn random_step<R: Rng + ?Sized>(grid: &Grid, from: Position, rng: &mut R) -> Option<Position> {
    let options: Vec<Position> = grid
        .neighborhood(from)
        .into_iter()
        .filter(|cell| !grid.has_collector_at(*cell))
        .collect();
    if options.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..options.len());
    options.get(idx).copied()
}
