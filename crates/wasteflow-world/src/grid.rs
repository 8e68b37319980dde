//! The occupancy grid.
//!
//! A [`Grid`] is an arena of cells indexed by `(x, y)`. Each cell holds a
//! small ordered set of [`Occupant`] tags, so several agents may share a
//! cell (a truck parked on a building, for example). The grid only stores
//! the cell -> occupant direction; every agent stores its own position and
//! moves through [`Grid::relocate`], which validates first and then applies
//! remove-then-insert so a rejected move leaves nothing half-done.
//!
//! # Topology
//!
//! [`Grid::neighborhood`] honours the configured [`Topology`]: on a
//! toroidal grid the 8-connected neighbors of an edge cell wrap around. The
//! directed step used by navigation ([`Grid::offset`]) never wraps.

use std::collections::BTreeSet;

use rand::Rng;
use wasteflow_types::{Occupant, Position, Topology};

use crate::error::WorldError;

/// Relative offsets of the 8-connected (Moore) neighborhood.
const MOORE_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Cell arena with per-cell occupant sets.
#[derive(Debug, Clone)]
pub struct Grid {
    /// Number of columns.
    width: u32,
    /// Number of rows.
    height: u32,
    /// Edge behaviour for neighborhood queries.
    topology: Topology,
    /// Row-major cells: index `y * width + x`.
    cells: Vec<BTreeSet<Occupant>>,
}

impl Grid {
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] if either dimension is zero, or
    /// [`WorldError::GridTooLarge`] if the cell count does not fit in memory
    /// indexing.
    pub fn new(width: u32, height: u32, topology: Topology) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyGrid { width, height });
        }
        let cell_count = u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(WorldError::GridTooLarge { width, height })?;

        Ok(Self {
            width,
            height,
            topology,
            cells: vec![BTreeSet::new(); cell_count],
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Edge behaviour.
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether `pos` lies on the grid.
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index_of(&self, pos: Position) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let row = usize::try_from(pos.y).ok()?;
        let col = usize::try_from(pos.x).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(col)
    }

    /// The cell one directed step from `pos`, or `None` if that step leaves
    /// the grid. Never wraps, regardless of topology.
    pub fn offset(&self, pos: Position, dx: i64, dy: i64) -> Option<Position> {
        let x = i64::from(pos.x).checked_add(dx)?;
        let y = i64::from(pos.y).checked_add(dy)?;
        let candidate = Position::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        self.contains(candidate).then_some(candidate)
    }

    /// The cell one step from `pos`, wrapping on a toroidal grid.
    fn neighbor(&self, pos: Position, dx: i64, dy: i64) -> Option<Position> {
        match self.topology {
            Topology::Bounded => self.offset(pos, dx, dy),
            Topology::Toroidal => {
                let x = i64::from(pos.x)
                    .checked_add(dx)?
                    .rem_euclid(i64::from(self.width));
                let y = i64::from(pos.y)
                    .checked_add(dy)?
                    .rem_euclid(i64::from(self.height));
                Some(Position::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?))
            }
        }
    }

    /// The 8-connected neighbors of `pos`, excluding `pos` itself.
    ///
    /// On narrow toroidal grids several offsets can wrap onto the same cell
    /// or back onto `pos`; duplicates and the center are dropped. The order
    /// is fixed so seeded random choices are reproducible.
    pub fn neighborhood(&self, pos: Position) -> Vec<Position> {
        let mut out = Vec::with_capacity(MOORE_OFFSETS.len());
        for &(dx, dy) in &MOORE_OFFSETS {
            if let Some(cell) = self.neighbor(pos, dx, dy)
                && cell != pos
                && !out.contains(&cell)
            {
                out.push(cell);
            }
        }
        out
    }

    /// Occupants of the cell at `pos` in stable order (empty off-grid).
    pub fn occupants_at(&self, pos: Position) -> impl Iterator<Item = Occupant> + '_ {
        self.index_of(pos)
            .and_then(|idx| self.cells.get(idx))
            .into_iter()
            .flat_map(|cell| cell.iter().copied())
    }

    /// Whether `occupant` is recorded at `pos`.
    pub fn is_at(&self, occupant: Occupant, pos: Position) -> bool {
        self.index_of(pos)
            .and_then(|idx| self.cells.get(idx))
            .is_some_and(|cell| cell.contains(&occupant))
    }

    /// Whether the cell at `pos` holds no occupants. Off-grid cells are not
    /// empty.
    pub fn is_cell_empty(&self, pos: Position) -> bool {
        self.index_of(pos)
            .and_then(|idx| self.cells.get(idx))
            .is_some_and(BTreeSet::is_empty)
    }

    /// Whether any collector occupies the cell at `pos`.
    pub fn has_collector_at(&self, pos: Position) -> bool {
        self.occupants_at(pos).any(Occupant::is_collector)
    }

    /// All empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if self.is_cell_empty(pos) {
                    out.push(pos);
                }
            }
        }
        out
    }

    /// A uniformly random empty cell, or `None` if the grid is full.
    pub fn random_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..empty.len());
        empty.get(idx).copied()
    }

    /// Record `occupant` at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is off-grid, or
    /// [`WorldError::AlreadyAtCell`] if the occupant is already there.
    pub fn place(&mut self, occupant: Occupant, pos: Position) -> Result<(), WorldError> {
        let idx = self.index_of(pos).ok_or(WorldError::OutOfBounds(pos))?;
        let cell = self
            .cells
            .get_mut(idx)
            .ok_or(WorldError::OutOfBounds(pos))?;
        if !cell.insert(occupant) {
            return Err(WorldError::AlreadyAtCell {
                occupant,
                position: pos,
            });
        }
        Ok(())
    }

    /// Remove `occupant` from the cell at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is off-grid, or
    /// [`WorldError::NotAtCell`] if the occupant is not recorded there.
    pub fn remove(&mut self, occupant: Occupant, pos: Position) -> Result<(), WorldError> {
        let idx = self.index_of(pos).ok_or(WorldError::OutOfBounds(pos))?;
        let cell = self
            .cells
            .get_mut(idx)
            .ok_or(WorldError::OutOfBounds(pos))?;
        if !cell.remove(&occupant) {
            return Err(WorldError::NotAtCell {
                occupant,
                position: pos,
            });
        }
        Ok(())
    }

    /// Move `occupant` from `from` to `to`.
    ///
    /// Both cells are validated before anything changes, so on error the
    /// grid is untouched. Callers update the agent's own position field only
    /// after this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if either cell is off-grid, or
    /// [`WorldError::NotAtCell`] if the occupant is not at `from`.
    pub fn relocate(
        &mut self,
        occupant: Occupant,
        from: Position,
        to: Position,
    ) -> Result<(), WorldError> {
        if !self.contains(to) {
            return Err(WorldError::OutOfBounds(to));
        }
        if !self.is_at(occupant, from) {
            return Err(WorldError::NotAtCell {
                occupant,
                position: from,
            });
        }
        if from == to {
            return Ok(());
        }
        self.remove(occupant, from)?;
        self.place(occupant, to)
    }

    /// Every `(position, occupant)` pair on the grid, row-major.
    pub fn iter_occupants(&self) -> impl Iterator<Item = (Position, Occupant)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().flat_map(move |(idx, cell)| {
            let idx = u32::try_from(idx).unwrap_or(u32::MAX);
            let pos = Position::new(
                idx.checked_rem(width).unwrap_or(0),
                idx.checked_div(width).unwrap_or(0),
            );
            cell.iter().map(move |occ| (pos, *occ))
        })
    }

    /// Total number of occupant records across all cells.
    pub fn occupant_count(&self) -> usize {
        self.cells.iter().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use wasteflow_types::{CollectorId, SourceId};

    use super::*;

    fn truck(n: u32) -> Occupant {
        Occupant::Collector(CollectorId::new(n))
    }

    fn building(n: u32) -> Occupant {
        Occupant::Source(SourceId::new(n))
    }

    #[test]
    fn zero_dimension_rejected() {
        assert!(matches!(
            Grid::new(0, 5, Topology::Bounded),
            Err(WorldError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn bounded_corner_has_three_neighbors() {
        let grid = Grid::new(5, 5, Topology::Bounded).unwrap();
        let n = grid.neighborhood(Position::new(0, 0));
        assert_eq!(n.len(), 3);
        assert!(n.contains(&Position::new(1, 1)));
    }

    #[test]
    fn toroidal_corner_wraps() {
        let grid = Grid::new(5, 5, Topology::Toroidal).unwrap();
        let n = grid.neighborhood(Position::new(0, 0));
        assert_eq!(n.len(), 8);
        assert!(n.contains(&Position::new(4, 4)));
        assert!(n.contains(&Position::new(0, 4)));
    }

    #[test]
    fn narrow_torus_dedupes_and_drops_center() {
        let grid = Grid::new(2, 1, Topology::Toroidal).unwrap();
        let n = grid.neighborhood(Position::new(0, 0));
        assert_eq!(n, vec![Position::new(1, 0)]);
    }

    #[test]
    fn offset_never_wraps() {
        let grid = Grid::new(3, 3, Topology::Toroidal).unwrap();
        assert_eq!(grid.offset(Position::new(0, 0), -1, 0), None);
        assert_eq!(grid.offset(Position::new(2, 2), 0, 1), None);
        assert_eq!(
            grid.offset(Position::new(1, 1), 1, -1),
            Some(Position::new(2, 0))
        );
    }

    #[test]
    fn relocate_moves_occupant() {
        let mut grid = Grid::new(4, 4, Topology::Bounded).unwrap();
        let a = Position::new(1, 1);
        let b = Position::new(2, 1);
        grid.place(truck(0), a).unwrap();
        grid.relocate(truck(0), a, b).unwrap();
        assert!(!grid.is_at(truck(0), a));
        assert!(grid.is_at(truck(0), b));
        assert!(grid.has_collector_at(b));
        assert_eq!(grid.occupant_count(), 1);
    }

    #[test]
    fn rejected_relocate_leaves_grid_untouched() {
        let mut grid = Grid::new(4, 4, Topology::Bounded).unwrap();
        let a = Position::new(3, 3);
        grid.place(truck(0), a).unwrap();

        let off_grid = Position::new(4, 3);
        assert!(matches!(
            grid.relocate(truck(0), a, off_grid),
            Err(WorldError::OutOfBounds(_))
        ));
        assert!(matches!(
            grid.relocate(truck(0), Position::new(0, 0), a),
            Err(WorldError::NotAtCell { .. })
        ));
        assert!(grid.is_at(truck(0), a));
        assert_eq!(grid.occupant_count(), 1);
    }

    #[test]
    fn cells_hold_multiple_occupants() {
        let mut grid = Grid::new(3, 3, Topology::Bounded).unwrap();
        let p = Position::new(1, 2);
        grid.place(building(0), p).unwrap();
        assert!(!grid.has_collector_at(p));
        grid.place(truck(1), p).unwrap();
        assert!(grid.has_collector_at(p));
        let occupants: Vec<Occupant> = grid.occupants_at(p).collect();
        assert_eq!(occupants, vec![building(0), truck(1)]);
        assert!(matches!(
            grid.place(truck(1), p),
            Err(WorldError::AlreadyAtCell { .. })
        ));
    }

    #[test]
    fn random_empty_cell_skips_occupied() {
        let mut grid = Grid::new(2, 2, Topology::Bounded).unwrap();
        grid.place(building(0), Position::new(0, 0)).unwrap();
        grid.place(building(1), Position::new(1, 0)).unwrap();
        grid.place(building(2), Position::new(0, 1)).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(grid.random_empty_cell(&mut rng), Some(Position::new(1, 1)));
        }
        grid.place(building(3), Position::new(1, 1)).unwrap();
        assert_eq!(grid.random_empty_cell(&mut rng), None);
    }

    #[test]
    fn iter_occupants_reports_positions() {
        let mut grid = Grid::new(3, 2, Topology::Bounded).unwrap();
        grid.place(Occupant::Sink, Position::new(0, 0)).unwrap();
        grid.place(truck(0), Position::new(2, 1)).unwrap();
        let all: Vec<(Position, Occupant)> = grid.iter_occupants().collect();
        assert_eq!(
            all,
            vec![
                (Position::new(0, 0), Occupant::Sink),
                (Position::new(2, 1), truck(0)),
            ]
        );
    }
}
