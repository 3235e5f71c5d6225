//! Plain text output of painted grids.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use wfc_core::{MemoryGrid, Point};
use wfc_rules::TileId;

/// Character written for cells the sink holds nothing for.
pub const EMPTY_CELL: char = ' ';

/// Character for tiles that are not a valid `char`.
pub const UNPRINTABLE_CELL: char = '?';

/// Printable character for `tile`.
pub fn tile_char(tile: TileId) -> char {
    tile.to_char().unwrap_or(UNPRINTABLE_CELL)
}

/// Writes the painted bounding box of `grid`, one character per tile and one
/// line per row. Returns the number of rows written.
pub fn write_grid<W: Write>(grid: &MemoryGrid, writer: &mut W) -> io::Result<usize> {
    let Some((min, max)) = grid.bounds() else {
        return Ok(0);
    };
    let cells = grid.snapshot();
    for y in min.y..=max.y {
        let line: String = (min.x..=max.x)
            .map(|x| cells.get(&Point::new(x, y)).map_or(EMPTY_CELL, |&t| tile_char(t)))
            .collect();
        writeln!(writer, "{line}")?;
    }
    Ok((max.y - min.y + 1) as usize)
}

/// Saves the painted part of `grid` to a file in the text format of [`write_grid`].
pub fn save_grid_to_file(grid: &MemoryGrid, output_path: &Path) -> Result<()> {
    log::info!("Attempting to save grid to {:?}...", output_path);

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {output_path:?}"))?;
    let mut writer = io::BufWriter::new(file);
    let rows = write_grid(grid, &mut writer)
        .with_context(|| format!("Failed to write grid rows to {output_path:?}"))?;
    writer
        .flush()
        .context("Failed to flush writer for output file")?;

    log::info!("Successfully saved {rows} rows to {:?}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfc_core::GridSink;

    #[test]
    fn writes_bounding_box_with_gaps() {
        let grid = MemoryGrid::new();
        grid.write(Point::new(-1, 0), TileId::from_char('#'));
        grid.write(Point::new(1, 1), TileId::from_char('.'));
        grid.write(Point::new(0, 1), TileId(0xD800));

        let mut out = Vec::new();
        assert_eq!(write_grid(&grid, &mut out).unwrap(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "#  \n ?.\n");
    }

    #[test]
    fn empty_grid_writes_nothing() {
        let mut out = Vec::new();
        assert_eq!(write_grid(&MemoryGrid::new(), &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn saves_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.txt");
        let grid = MemoryGrid::new();
        grid.write(Point::ORIGIN, TileId::from_char('x'));
        save_grid_to_file(&grid, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    }
}
