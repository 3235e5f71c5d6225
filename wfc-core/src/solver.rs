//! The constraint engine: wave, support counters, ban/propagate/observe.

use crate::entropy::{self, shannon_entropy, CellStats, Heuristic};
use crate::grid::PossibilityGrid;
use crate::{BoundaryMode, WfcError};
use bitvec::prelude::*;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use wfc_rules::{AdjacencyRules, Direction};

/// Hook run after `clear` and before the observe loop starts.
///
/// Implementations restrict the fresh wave with [`WaveSolver::ban`]; the solver
/// propagates right after the hook returns.
pub trait PreBan {
    fn pre_ban(&self, solver: &mut WaveSolver);
}

/// The default hook: bans nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreBan;

impl PreBan for NoPreBan {
    fn pre_ban(&self, _solver: &mut WaveSolver) {}
}

/// Wave Function Collapse solver over a fixed-size output grid.
///
/// The pattern table (weights plus adjacency rules) is fixed at construction;
/// every [`run`](Self::run) starts from a cleared wave.
#[derive(Debug, Clone)]
pub struct WaveSolver {
    width: usize,
    height: usize,
    pattern_size: usize,
    boundary_mode: BoundaryMode,
    heuristic: Heuristic,
    ground: bool,

    rules: Arc<AdjacencyRules>,
    weights: Vec<f64>,
    weight_log_weights: Vec<f64>,
    sum_of_weights: f64,
    sum_of_weight_log_weights: f64,
    starting_entropy: f64,

    wave: PossibilityGrid,
    /// Support counters, indexed `[cell * T + pattern][direction]`.
    compatible: Vec<[usize; 4]>,
    observed: Vec<Option<usize>>,
    stack: Vec<(usize, usize)>,
    observed_so_far: usize,

    sums_of_ones: Vec<usize>,
    sums_of_weights: Vec<f64>,
    sums_of_weight_log_weights: Vec<f64>,
    entropies: Vec<f64>,
    contradiction: Option<usize>,
}

/// Per-pattern support counts of a cell whose neighbours still allow everything.
fn starting_support(rules: &AdjacencyRules) -> Vec<[usize; 4]> {
    (0..rules.num_patterns())
        .map(|pattern| Direction::ALL.map(|d| rules.compatible(d.opposite(), pattern).len()))
        .collect()
}

impl WaveSolver {
    /// Creates a solver for a `width`×`height` output.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::ConfigurationError` if the output is empty, the pattern
    /// does not fit a clamped output, `weights` is empty or holds a non-positive or
    /// non-finite value, or `rules` covers a different number of patterns.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: usize,
        height: usize,
        pattern_size: usize,
        boundary_mode: BoundaryMode,
        heuristic: Heuristic,
        ground: bool,
        weights: Vec<f64>,
        rules: Arc<AdjacencyRules>,
    ) -> Result<Self, WfcError> {
        if width == 0 || height == 0 {
            return Err(WfcError::ConfigurationError(format!(
                "Output dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if pattern_size == 0 {
            return Err(WfcError::ConfigurationError(
                "Pattern size must be at least 1".to_owned(),
            ));
        }
        if boundary_mode == BoundaryMode::Clamped && (pattern_size > width || pattern_size > height) {
            return Err(WfcError::ConfigurationError(format!(
                "Pattern size {pattern_size} does not fit a clamped {width}x{height} output"
            )));
        }
        if weights.is_empty() {
            return Err(WfcError::ConfigurationError(
                "At least one pattern is required".to_owned(),
            ));
        }
        if let Some(index) = weights.iter().position(|w| !w.is_finite() || *w <= 0.0) {
            return Err(WfcError::ConfigurationError(format!(
                "Pattern {index} has invalid weight {}",
                weights[index]
            )));
        }
        if rules.num_patterns() != weights.len() {
            return Err(WfcError::ConfigurationError(format!(
                "Adjacency rules cover {} patterns but {} weights were given",
                rules.num_patterns(),
                weights.len()
            )));
        }

        let weight_log_weights: Vec<f64> = weights.iter().map(|w| w * w.ln()).collect();
        let sum_of_weights: f64 = weights.iter().sum();
        let sum_of_weight_log_weights: f64 = weight_log_weights.iter().sum();
        let starting_entropy = shannon_entropy(sum_of_weights, sum_of_weight_log_weights);
        let num_patterns = weights.len();
        let cells = width * height;
        let compatible = starting_support(&rules).repeat(cells);

        debug!(
            "Solver ready: {}x{} output, {} patterns, {:?}, {:?}",
            width, height, num_patterns, boundary_mode, heuristic
        );

        Ok(Self {
            width,
            height,
            pattern_size,
            boundary_mode,
            heuristic,
            ground,
            rules,
            weights,
            weight_log_weights,
            sum_of_weights,
            sum_of_weight_log_weights,
            starting_entropy,
            wave: PossibilityGrid::filled(width, height, bitvec![1; num_patterns]),
            compatible,
            observed: vec![None; cells],
            stack: Vec::with_capacity(cells * num_patterns),
            observed_so_far: 0,
            sums_of_ones: vec![num_patterns; cells],
            sums_of_weights: vec![sum_of_weights; cells],
            sums_of_weight_log_weights: vec![sum_of_weight_log_weights; cells],
            entropies: vec![starting_entropy; cells],
            contradiction: None,
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn pattern_size(&self) -> usize {
        self.pattern_size
    }

    pub const fn boundary_mode(&self) -> BoundaryMode {
        self.boundary_mode
    }

    /// Number of patterns T.
    pub fn num_patterns(&self) -> usize {
        self.weights.len()
    }

    /// Flat index of `(x, y)`, or `None` outside the output.
    pub fn cell_index(&self, x: usize, y: usize) -> Option<usize> {
        self.wave.index(x, y)
    }

    /// Final pattern per cell; `None` until the cell is resolved.
    pub fn observed(&self) -> &[Option<usize>] {
        &self.observed
    }

    pub const fn wave(&self) -> &PossibilityGrid {
        &self.wave
    }

    pub fn is_allowed(&self, cell: usize, pattern: usize) -> bool {
        self.wave
            .cells()
            .get(cell)
            .and_then(|bits| bits.get(pattern).map(|bit| *bit))
            .unwrap_or(false)
    }

    /// Number of patterns still allowed at `cell`.
    pub fn remaining(&self, cell: usize) -> usize {
        self.sums_of_ones.get(cell).copied().unwrap_or(0)
    }

    pub fn entropy(&self, cell: usize) -> f64 {
        self.entropies.get(cell).copied().unwrap_or(0.0)
    }

    /// Whether `cell` anchors a footprint that fits the output, i.e. it takes part
    /// in selection and receives propagation.
    pub fn is_active(&self, cell: usize) -> bool {
        cell < self.observed.len() && self.stats().is_eligible(cell)
    }

    /// First cell that ran out of patterns during the current run.
    pub const fn contradiction(&self) -> Option<usize> {
        self.contradiction
    }

    fn stats(&self) -> CellStats<'_> {
        CellStats {
            width: self.width,
            height: self.height,
            pattern_size: self.pattern_size,
            periodic: self.boundary_mode == BoundaryMode::Periodic,
            sums_of_ones: &self.sums_of_ones,
            entropies: &self.entropies,
        }
    }

    /// Resets the wave and bookkeeping, then applies the ground constraint if enabled.
    ///
    /// Returns `false` iff the ground constraint itself contradicts.
    pub fn clear(&mut self) -> bool {
        let num_patterns = self.num_patterns();
        self.wave.data.iter_mut().for_each(|bits| bits.fill(true));
        let support = starting_support(&self.rules);
        for cell_counters in self.compatible.chunks_mut(num_patterns) {
            cell_counters.copy_from_slice(&support);
        }
        self.sums_of_ones.fill(num_patterns);
        self.sums_of_weights.fill(self.sum_of_weights);
        self.sums_of_weight_log_weights
            .fill(self.sum_of_weight_log_weights);
        self.entropies.fill(self.starting_entropy);
        self.observed.fill(None);
        self.stack.clear();
        self.observed_so_far = 0;
        self.contradiction = None;

        if self.ground {
            let last = num_patterns - 1;
            let bottom = (self.height - 1) * self.width;
            for x in 0..self.width {
                for pattern in 0..last {
                    self.ban(bottom + x, pattern);
                }
                for y in 0..self.height - 1 {
                    self.ban(x + y * self.width, last);
                }
            }
            return self.propagate();
        }
        true
    }

    /// Removes `pattern` from `cell`.
    ///
    /// Banning an already-banned pair is a no-op.
    pub fn ban(&mut self, cell: usize, pattern: usize) {
        if !self.is_allowed(cell, pattern) {
            return;
        }
        let num_patterns = self.num_patterns();
        self.wave.data[cell].set(pattern, false);
        self.compatible[cell * num_patterns + pattern] = [0; 4];
        self.stack.push((cell, pattern));

        self.sums_of_ones[cell] -= 1;
        self.sums_of_weights[cell] -= self.weights[pattern];
        self.sums_of_weight_log_weights[cell] -= self.weight_log_weights[pattern];

        if self.sums_of_ones[cell] == 0 {
            self.entropies[cell] = 0.0;
            if self.contradiction.is_none() {
                trace!("Contradiction at cell {cell}");
                self.contradiction = Some(cell);
            }
        } else {
            self.entropies[cell] = shannon_entropy(
                self.sums_of_weights[cell],
                self.sums_of_weight_log_weights[cell],
            );
        }
    }

    /// Neighbour of `(x, y)` in `direction`, honouring the boundary mode.
    fn neighbour(&self, x: usize, y: usize, direction: Direction) -> Option<usize> {
        let (dx, dy) = direction.offset();
        let x2 = x as isize + dx;
        let y2 = y as isize + dy;
        let (w, h, n) = (
            self.width as isize,
            self.height as isize,
            self.pattern_size as isize,
        );
        match self.boundary_mode {
            BoundaryMode::Clamped => {
                if x2 < 0 || y2 < 0 || x2 + n > w || y2 + n > h {
                    return None;
                }
                Some((x2 + y2 * w) as usize)
            }
            BoundaryMode::Periodic => {
                Some((x2.rem_euclid(w) + y2.rem_euclid(h) * w) as usize)
            }
        }
    }

    /// Drains the ban stack, removing every pattern that lost its last support.
    ///
    /// Returns `false` if any cell has no patterns left.
    pub fn propagate(&mut self) -> bool {
        let num_patterns = self.num_patterns();
        let rules = Arc::clone(&self.rules);
        while let Some((cell, pattern)) = self.stack.pop() {
            let (x1, y1) = self.wave.coords(cell);
            for direction in Direction::ALL {
                let Some(neighbour) = self.neighbour(x1, y1, direction) else {
                    continue;
                };
                for &other in rules.compatible(direction, pattern) {
                    let counter =
                        &mut self.compatible[neighbour * num_patterns + other][direction.index()];
                    if *counter == 0 {
                        continue;
                    }
                    *counter -= 1;
                    if *counter == 0 {
                        self.ban(neighbour, other);
                    }
                }
            }
        }
        self.contradiction.is_none()
    }

    /// Picks the next cell to observe with the configured heuristic.
    pub fn next_unobserved_node<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let mut scan_from = self.observed_so_far;
        let node = entropy::select(self.heuristic, &self.stats(), &mut scan_from, rng);
        self.observed_so_far = scan_from;
        node
    }

    /// Collapses `cell` to one allowed pattern drawn by weight, banning the rest.
    ///
    /// The caller propagates afterwards.
    pub fn observe<R: Rng + ?Sized>(&mut self, cell: usize, rng: &mut R) {
        let Some(bits) = self.wave.cells().get(cell) else {
            return;
        };
        let total: f64 = bits.iter_ones().map(|t| self.weights[t]).sum();
        let threshold = rng.gen::<f64>() * total;
        let mut partial = 0.0;
        let mut chosen = None;
        for t in bits.iter_ones() {
            partial += self.weights[t];
            if partial >= threshold {
                chosen = Some(t);
                break;
            }
        }
        // Rounding can leave the threshold above the final partial sum.
        let Some(chosen) = chosen.or_else(|| bits.first_one()) else {
            return;
        };
        let others: Vec<usize> = bits.iter_ones().filter(|&t| t != chosen).collect();
        for t in others {
            self.ban(cell, t);
        }
    }

    /// Runs one attempt with no pre-ban hook.
    pub fn run(&mut self, seed: u64, limit: usize) -> bool {
        self.run_with(seed, limit, &NoPreBan)
    }

    /// Runs one attempt: clear, pre-ban, propagate, then observe until every
    /// active cell is decided or `limit` observations were made (`0` = unbounded).
    ///
    /// Returns `false` on contradiction. Hitting the limit counts as success and
    /// leaves undecided cells unobserved.
    pub fn run_with(&mut self, seed: u64, limit: usize, hook: &dyn PreBan) -> bool {
        if !self.clear() {
            debug!("Ground constraint contradicts");
            return false;
        }
        hook.pre_ban(self);
        if !self.propagate() {
            debug!("Pre-banned wave contradicts at {:?}", self.contradiction);
            return false;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut steps = 0;
        while limit == 0 || steps < limit {
            match self.next_unobserved_node(&mut rng) {
                Some(node) => {
                    self.observe(node, &mut rng);
                    if !self.propagate() {
                        debug!(
                            "Contradiction after {} observations (seed {})",
                            steps + 1,
                            seed
                        );
                        return false;
                    }
                }
                None => {
                    for (cell, bits) in self.wave.data.iter().enumerate() {
                        self.observed[cell] = bits.first_one();
                    }
                    return true;
                }
            }
            steps += 1;
        }

        for (cell, bits) in self.wave.data.iter().enumerate() {
            if self.sums_of_ones[cell] == 1 {
                self.observed[cell] = bits.first_one();
            }
        }
        debug!("Observation limit {limit} reached");
        true
    }
}
