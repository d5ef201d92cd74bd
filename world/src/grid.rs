//! Dense grid of static entity references.

use tag_jam_core::{EntityId, TileCoord};

/// Fixed-size grid holding at most one static entity per tile.
///
/// The grid stores identifiers only; the entity registry owns the entities.
/// Every lookup outside `[0, columns) x [0, rows)` behaves like an empty tile.
#[derive(Clone, Debug, Default)]
pub struct StaticGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<EntityId>>,
}

impl StaticGrid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: TileCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Static entity registered at the tile, if any.
    #[must_use]
    pub fn static_entity_at(&self, cell: TileCoord) -> Option<EntityId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Registers `entity` at the tile and returns the previous occupant.
    ///
    /// Out-of-range tiles are left untouched and report no previous occupant.
    pub fn set_static_entity_at(&mut self, entity: EntityId, cell: TileCoord) -> Option<EntityId> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)?.replace(entity)
    }

    /// Empties every tile that references `entity`.
    pub(crate) fn forget(&mut self, entity: EntityId) {
        for slot in &mut self.cells {
            if *slot == Some(entity) {
                *slot = None;
            }
        }
    }

    fn index(&self, cell: TileCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            row.checked_mul(width)?.checked_add(column)
        } else {
            None
        }
    }
}
