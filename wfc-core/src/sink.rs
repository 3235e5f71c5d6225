//! The output side of generation: where solved tiles are committed and read back.

use crate::grid::Point;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use wfc_rules::TileId;

/// Destination for generated tiles, addressed by absolute world position.
///
/// Writes are fire-and-forget. `read` returns `None` for cells nothing has painted yet;
/// it backs both preset registration and the "already generated" check.
#[cfg_attr(test, mockall::automock)]
pub trait GridSink: Send + Sync {
    fn write(&self, position: Point, tile: TileId);

    fn read(&self, position: Point) -> Option<TileId>;
}

/// An in-memory sparse sink.
#[derive(Debug, Default)]
pub struct MemoryGrid {
    cells: RwLock<HashMap<Point, TileId>>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of painted cells.
    pub fn len(&self) -> usize {
        self.cells.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inclusive bounding box `(min, max)` of all painted cells.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys = cells.keys();
        let first = *keys.next()?;
        Some(keys.fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }

    /// Copy of every painted cell.
    pub fn snapshot(&self) -> HashMap<Point, TileId> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl GridSink for MemoryGrid {
    fn write(&self, position: Point, tile: TileId) {
        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(position, tile);
    }

    fn read(&self, position: Point) -> Option<TileId> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&position)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_grid_reads_back_writes() {
        let grid = MemoryGrid::new();
        assert!(grid.is_empty());
        assert_eq!(grid.bounds(), None);

        grid.write(Point::new(2, -1), TileId::from_char('#'));
        grid.write(Point::new(-3, 4), TileId::from_char('.'));
        grid.write(Point::new(2, -1), TileId::from_char('~'));

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.read(Point::new(2, -1)), Some(TileId::from_char('~')));
        assert_eq!(grid.read(Point::new(0, 0)), None);
        assert_eq!(
            grid.bounds(),
            Some((Point::new(-3, -1), Point::new(2, 4)))
        );
        assert_eq!(grid.snapshot().len(), 2);
    }
}
