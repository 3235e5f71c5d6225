//! Terminal preview of the painted grid.

use crate::output::{tile_char, EMPTY_CELL};
use colored::{Color, ColoredString, Colorize};
use std::io::{self, Write};
use wfc_core::{MemoryGrid, Point};
use wfc_rules::TileId;

/// Trait for types that can visualize a generated grid.
///
/// Implementors of this trait define how the painted cells are presented to
/// the user, such as via terminal output.
pub trait Visualizer {
    /// Displays the current contents of `grid`.
    fn display_state(&mut self, grid: &MemoryGrid) -> Result<(), anyhow::Error>;
}

const PALETTE: [Color; 7] = [
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Red,
    Color::White,
];

/// Colour for a tile; the same tile always gets the same colour.
pub const fn tile_color(tile: TileId) -> Color {
    PALETTE[tile.0 as usize % PALETTE.len()]
}

fn colorize(tile: TileId) -> ColoredString {
    tile_char(tile).to_string().color(tile_color(tile))
}

/// Renders the grid to a writer (stdout by default) with one colour per tile.
pub struct TerminalVisualizer<W: Write> {
    out: W,
}

impl TerminalVisualizer<io::Stdout> {
    /// Visualizer writing to stdout.
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalVisualizer<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalVisualizer<W> {
    /// Visualizer writing to `out`.
    pub const fn with_writer(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Visualizer for TerminalVisualizer<W> {
    fn display_state(&mut self, grid: &MemoryGrid) -> Result<(), anyhow::Error> {
        let Some((min, max)) = grid.bounds() else {
            writeln!(self.out, "(empty grid)")?;
            return Ok(());
        };
        let cells = grid.snapshot();
        writeln!(
            self.out,
            "--- {}x{} cells from {min} ---",
            max.x - min.x + 1,
            max.y - min.y + 1
        )?;
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                match cells.get(&Point::new(x, y)) {
                    Some(&tile) => write!(self.out, "{}", colorize(tile))?,
                    None => write!(self.out, "{EMPTY_CELL}")?,
                }
            }
            writeln!(self.out)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfc_core::GridSink;

    #[test]
    fn colours_are_stable_per_tile() {
        let wall = TileId::from_char('#');
        assert_eq!(tile_color(wall), tile_color(wall));
        assert_ne!(
            tile_color(TileId(0)),
            tile_color(TileId(1)),
            "neighbouring ids get distinct colours"
        );
    }

    #[test]
    fn renders_rows_in_plain_mode() {
        colored::control::set_override(false);
        let grid = MemoryGrid::new();
        grid.write(Point::new(2, 3), TileId::from_char('#'));
        grid.write(Point::new(3, 4), TileId::from_char('.'));

        let mut viz = TerminalVisualizer::with_writer(Vec::new());
        viz.display_state(&grid).unwrap();
        let text = String::from_utf8(viz.into_inner()).unwrap();
        assert_eq!(text, "--- 2x2 cells from (2, 3) ---\n# \n .\n");
    }

    #[test]
    fn empty_grid_is_reported() {
        let mut viz = TerminalVisualizer::with_writer(Vec::new());
        viz.display_state(&MemoryGrid::new()).unwrap();
        assert_eq!(String::from_utf8(viz.into_inner()).unwrap(), "(empty grid)\n");
    }
}
