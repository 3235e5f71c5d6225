//! Collaborator interfaces the catalog reads samples through, plus the
//! in-memory implementations produced by the sample file loader.

use crate::types::TileId;
use crate::LoadError;
use std::collections::HashMap;

/// Read access to one sample grid.
pub trait GridSource {
    /// Width of the sample in cells.
    fn width(&self) -> usize;

    /// Height of the sample in cells.
    fn height(&self) -> usize;

    /// Tile identity at an in-bounds coordinate.
    fn tile_at(&self, x: usize, y: usize) -> TileId;
}

/// Maps a tile to its rotated (90 degrees) or reflected counterpart.
///
/// `None` means the tile maps to itself.
pub trait SymmetryMappingSource {
    fn rotated(&self, tile: TileId) -> Option<TileId>;

    fn reflected(&self, tile: TileId) -> Option<TileId>;
}

/// A rectangular sample stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    tiles: Vec<TileId>,
}

impl SampleGrid {
    /// Creates a sample from row-major tiles.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidData` if `tiles.len() != width * height`.
    pub fn new(width: usize, height: usize, tiles: Vec<TileId>) -> Result<Self, LoadError> {
        if tiles.len() != width * height {
            return Err(LoadError::InvalidData(format!(
                "Sample has {} tiles, expected {}x{}",
                tiles.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Builds a sample from text rows, one character per tile.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidData` for an empty sample or ragged rows.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, LoadError> {
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if width == 0 {
            return Err(LoadError::InvalidData("Sample has no tiles".to_owned()));
        }
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let row_width = row.chars().count();
            if row_width != width {
                return Err(LoadError::InvalidData(format!(
                    "Sample row {y} has {row_width} tiles, expected {width}"
                )));
            }
            tiles.extend(row.chars().map(TileId::from_char));
        }
        Self::new(width, rows.len(), tiles)
    }
}

impl GridSource for SampleGrid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn tile_at(&self, x: usize, y: usize) -> TileId {
        self.tiles[x + y * self.width]
    }
}

/// Explicit rotate/reflect tables keyed by tile identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymmetryTable {
    pub rotate: HashMap<TileId, TileId>,
    pub reflect: HashMap<TileId, TileId>,
}

impl SymmetryTable {
    /// A table where every tile maps to itself.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Builds a table from `(from, to)` character pairs.
    pub fn from_chars(rotate: &[(char, char)], reflect: &[(char, char)]) -> Self {
        let to_map = |pairs: &[(char, char)]| {
            pairs
                .iter()
                .map(|&(from, to)| (TileId::from_char(from), TileId::from_char(to)))
                .collect()
        };
        Self {
            rotate: to_map(rotate),
            reflect: to_map(reflect),
        }
    }
}

impl SymmetryMappingSource for SymmetryTable {
    fn rotated(&self, tile: TileId) -> Option<TileId> {
        self.rotate.get(&tile).copied()
    }

    fn reflected(&self, tile: TileId) -> Option<TileId> {
        self.reflect.get(&tile).copied()
    }
}

/// Everything a sample file describes.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    pub samples: Vec<SampleGrid>,
    pub symmetry: SymmetryTable,
}

impl SampleSet {
    /// Borrows the samples as trait objects, the form the catalog consumes.
    pub fn sources(&self) -> Vec<&dyn GridSource> {
        self.samples.iter().map(|s| s as &dyn GridSource).collect()
    }
}
