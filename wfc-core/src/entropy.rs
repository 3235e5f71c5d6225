//! Cell selection heuristics for the observe step.
//!
//! Each heuristic is a pure function over a read-only [`CellStats`] view of the
//! solver bookkeeping; [`select`] dispatches on the [`Heuristic`] tag.

use rand::Rng;

/// Scale of the random tie-break added to each candidate.
const JITTER: f64 = 1e-6;

/// Strategy for picking the next cell to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Heuristic {
    /// Lowest Shannon entropy first.
    #[default]
    Entropy,
    /// Minimum remaining values: fewest allowed patterns first.
    Mrv,
    /// First undecided cell in row-major order.
    Scanline,
}

/// Shannon entropy of a cell from its running weight sums.
///
/// `ln(sum_w) - sum_wlogw / sum_w`
#[inline]
pub fn shannon_entropy(sum_of_weights: f64, sum_of_weight_log_weights: f64) -> f64 {
    sum_of_weights.ln() - sum_of_weight_log_weights / sum_of_weights
}

/// Read-only view of the per-cell bookkeeping the heuristics look at.
#[derive(Debug, Clone, Copy)]
pub struct CellStats<'a> {
    pub width: usize,
    pub height: usize,
    pub pattern_size: usize,
    pub periodic: bool,
    pub sums_of_ones: &'a [usize],
    pub entropies: &'a [f64],
}

impl CellStats<'_> {
    /// Whether the N×N footprint anchored at `cell` fits the output.
    ///
    /// Always true on periodic outputs.
    #[inline]
    pub const fn is_eligible(&self, cell: usize) -> bool {
        self.periodic
            || (cell % self.width + self.pattern_size <= self.width
                && cell / self.width + self.pattern_size <= self.height)
    }
}

/// First eligible undecided cell at or after `from`.
pub fn scanline(stats: &CellStats<'_>, from: usize) -> Option<usize> {
    (from..stats.sums_of_ones.len())
        .find(|&cell| stats.is_eligible(cell) && stats.sums_of_ones[cell] > 1)
}

fn jittered_min<R: Rng + ?Sized>(
    stats: &CellStats<'_>,
    rng: &mut R,
    score: impl Fn(usize) -> f64,
) -> Option<usize> {
    let mut min = f64::INFINITY;
    let mut arg_min = None;
    for cell in 0..stats.sums_of_ones.len() {
        if !stats.is_eligible(cell) || stats.sums_of_ones[cell] <= 1 {
            continue;
        }
        let value = score(cell);
        if value <= min {
            let noise = JITTER * rng.gen::<f64>();
            if value + noise < min {
                min = value + noise;
                arg_min = Some(cell);
            }
        }
    }
    arg_min
}

/// Eligible undecided cell with the lowest entropy, ties broken by jitter.
pub fn min_entropy<R: Rng + ?Sized>(stats: &CellStats<'_>, rng: &mut R) -> Option<usize> {
    jittered_min(stats, rng, |cell| stats.entropies[cell])
}

/// Eligible undecided cell with the fewest remaining patterns, ties broken by jitter.
pub fn min_remaining<R: Rng + ?Sized>(stats: &CellStats<'_>, rng: &mut R) -> Option<usize> {
    jittered_min(stats, rng, |cell| stats.sums_of_ones[cell] as f64)
}

/// Picks the next cell to observe.
///
/// `scan_from` is the scanline resume point; it advances past every cell the
/// scanline heuristic hands out and is ignored by the other heuristics.
pub fn select<R: Rng + ?Sized>(
    heuristic: Heuristic,
    stats: &CellStats<'_>,
    scan_from: &mut usize,
    rng: &mut R,
) -> Option<usize> {
    match heuristic {
        Heuristic::Scanline => {
            let cell = scanline(stats, *scan_from)?;
            *scan_from = cell + 1;
            Some(cell)
        }
        Heuristic::Entropy => min_entropy(stats, rng),
        Heuristic::Mrv => min_remaining(stats, rng),
    }
}
