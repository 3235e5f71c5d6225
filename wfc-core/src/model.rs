use crate::grid::Point;
use crate::runner::WfcConfig;
use crate::sink::GridSink;
use crate::solver::{PreBan, WaveSolver};
use crate::{BoundaryMode, WfcError};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use wfc_rules::{
    AdjacencyRules, Category, GridSource, Pattern, PatternCatalog, SymmetryMappingSource,
};

/// Bans every pattern that disagrees with a preset cell it would cover.
struct PresetBan<'a> {
    presets: &'a BTreeMap<(usize, usize), Category>,
    patterns: &'a [Pattern],
}

impl PresetBan<'_> {
    /// Anchor whose footprint covers `(px, py)` at pattern offset `(dx, dy)`.
    fn anchor(solver: &WaveSolver, px: usize, py: usize, dx: usize, dy: usize) -> Option<usize> {
        let (w, h, n) = (solver.width(), solver.height(), solver.pattern_size());
        match solver.boundary_mode() {
            BoundaryMode::Periodic => {
                let ax = (px as isize - dx as isize).rem_euclid(w as isize) as usize;
                let ay = (py as isize - dy as isize).rem_euclid(h as isize) as usize;
                solver.cell_index(ax, ay)
            }
            BoundaryMode::Clamped => {
                let ax = px.checked_sub(dx)?;
                let ay = py.checked_sub(dy)?;
                if ax + n > w || ay + n > h {
                    return None;
                }
                solver.cell_index(ax, ay)
            }
        }
    }
}

impl PreBan for PresetBan<'_> {
    fn pre_ban(&self, solver: &mut WaveSolver) {
        let n = solver.pattern_size();
        for (&(px, py), &category) in self.presets {
            for dy in 0..n {
                for dx in 0..n {
                    let Some(cell) = Self::anchor(solver, px, py, dx, dy) else {
                        continue;
                    };
                    for (t, pattern) in self.patterns.iter().enumerate() {
                        if pattern.get(dx, dy) != category {
                            solver.ban(cell, t);
                        }
                    }
                }
            }
        }
    }
}

/// The overlapping model: a pattern catalog, its adjacency rules and a solver,
/// bound to the sink results are painted into.
///
/// Built once and reused for every chunk of a world.
pub struct OverlappingModel {
    catalog: PatternCatalog,
    rules: Arc<AdjacencyRules>,
    solver: WaveSolver,
    sink: Arc<dyn GridSink>,
    /// Local cell -> committed category, read back from the sink.
    presets: BTreeMap<(usize, usize), Category>,
}

impl fmt::Debug for OverlappingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlappingModel")
            .field("patterns", &self.catalog.len())
            .field("width", &self.solver.width())
            .field("height", &self.solver.height())
            .field("presets", &self.presets.len())
            .finish_non_exhaustive()
    }
}

impl OverlappingModel {
    /// Scans the samples, extracts patterns and builds the propagator and solver.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::Catalog` for sample or symmetry problems and
    /// `WfcError::ConfigurationError` for an invalid output configuration.
    pub fn new(
        sources: &[&dyn GridSource],
        symmetry_source: &dyn SymmetryMappingSource,
        sink: Arc<dyn GridSink>,
        config: &WfcConfig,
    ) -> Result<Self, WfcError> {
        let catalog =
            PatternCatalog::from_sources(sources, symmetry_source, config.catalog_options())?;
        let rules = Arc::new(AdjacencyRules::build(catalog.patterns()));
        let solver = WaveSolver::new(
            config.width,
            config.height,
            catalog.pattern_size(),
            config.boundary_mode,
            config.heuristic,
            config.ground,
            catalog.weights().to_vec(),
            Arc::clone(&rules),
        )?;
        info!(
            "Overlapping model ready: {} patterns, {}x{} output",
            catalog.len(),
            config.width,
            config.height
        );
        Ok(Self {
            catalog,
            rules,
            solver,
            sink,
            presets: BTreeMap::new(),
        })
    }

    pub const fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &AdjacencyRules {
        &self.rules
    }

    pub const fn solver(&self) -> &WaveSolver {
        &self.solver
    }

    pub fn sink(&self) -> &dyn GridSink {
        self.sink.as_ref()
    }

    pub const fn width(&self) -> usize {
        self.solver.width()
    }

    pub const fn height(&self) -> usize {
        self.solver.height()
    }

    /// Reads every already-painted cell of the output footprint at `origin`
    /// into the preset table, replacing the previous presets.
    ///
    /// Tiles the catalog has never seen cannot constrain anything and are skipped.
    pub fn register_preset_tiles(&mut self, origin: Point) {
        self.presets.clear();
        let mut unknown = 0usize;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let Some(tile) = self.sink.read(origin.offset(x, y)) else {
                    continue;
                };
                match self.catalog.dictionary().category(tile) {
                    Some(category) => {
                        self.presets.insert((x, y), category);
                    }
                    None => unknown += 1,
                }
            }
        }
        if unknown > 0 {
            warn!("Skipped {unknown} preset cells at {origin} with tiles unknown to the samples");
        }
        debug!("Registered {} preset cells at {origin}", self.presets.len());
    }

    /// Number of cells the next run is constrained by.
    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }

    pub fn clear_presets(&mut self) {
        self.presets.clear();
    }

    /// Clears the solver and applies the presets without observing anything,
    /// so the constrained wave can be inspected.
    ///
    /// Returns `false` if the presets (or the ground constraint) contradict.
    pub fn prepare(&mut self) -> bool {
        if !self.solver.clear() {
            return false;
        }
        PresetBan {
            presets: &self.presets,
            patterns: self.catalog.patterns(),
        }
        .pre_ban(&mut self.solver);
        self.solver.propagate()
    }

    /// One solve attempt under the registered presets.
    pub fn run(&mut self, seed: u64, limit: usize) -> bool {
        let hook = PresetBan {
            presets: &self.presets,
            patterns: self.catalog.patterns(),
        };
        self.solver.run_with(seed, limit, &hook)
    }

    /// Paints the last result into the sink with its top-left corner at `origin`.
    ///
    /// Each cell takes its value from the anchor covering it, with anchors clamped
    /// near the right and bottom edges. Cells already holding the same tile are not
    /// rewritten. Returns `false` if some cell had no resolved anchor.
    pub fn save(&self, origin: Point) -> bool {
        let (w, h, n) = (self.width(), self.height(), self.catalog.pattern_size());
        let observed = self.solver.observed();
        let mut complete = true;
        let mut written = 0usize;
        for y in 0..h {
            let dy = if y + n <= h { 0 } else { (n - 1).min(y) };
            for x in 0..w {
                let dx = if x + n <= w { 0 } else { (n - 1).min(x) };
                let anchor = (x - dx) + (y - dy) * w;
                let tile = observed[anchor].and_then(|t| {
                    self.catalog
                        .dictionary()
                        .tile(self.catalog.patterns()[t].get(dx, dy))
                });
                let Some(tile) = tile else {
                    complete = false;
                    continue;
                };
                let position = origin.offset(x, y);
                if self.sink.read(position) != Some(tile) {
                    self.sink.write(position, tile);
                    written += 1;
                }
            }
        }
        debug!("Saved output at {origin}: {written} cells written");
        if !complete {
            warn!("Output at {origin} has unresolved cells");
        }
        complete
    }

    pub fn save_default(&self) -> bool {
        self.save(Point::ORIGIN)
    }

    /// Paints every catalog pattern as an N×N block, in rows of ⌈√T⌉ blocks
    /// separated by one empty cell. Returns the number of cells painted.
    pub fn save_patterns(&self, origin: Point) -> usize {
        let n = self.catalog.pattern_size();
        let count = self.catalog.len();
        let mut per_row = 1;
        while per_row * per_row < count {
            per_row += 1;
        }
        let mut painted = 0;
        for (index, pattern) in self.catalog.patterns().iter().enumerate() {
            let block = origin.offset((index % per_row) * (n + 1), (index / per_row) * (n + 1));
            for y in 0..n {
                for x in 0..n {
                    if let Some(tile) = self.catalog.dictionary().tile(pattern.get(x, y)) {
                        self.sink.write(block.offset(x, y), tile);
                        painted += 1;
                    }
                }
            }
        }
        painted
    }

    /// Whether the interior of the footprint at `origin` is fully painted.
    ///
    /// The interior excludes the N-1 wide band shared with neighbouring chunks,
    /// so a chunk whose borders were painted by its neighbours still counts as new.
    pub fn is_generated(&self, origin: Point) -> bool {
        let margin = self.catalog.pattern_size() - 1;
        let span = |size: usize| {
            if size > 2 * margin {
                margin..size - margin
            } else {
                0..size
            }
        };
        span(self.height()).all(|y| {
            span(self.width()).all(|x| self.sink.read(origin.offset(x, y)).is_some())
        })
    }
}
