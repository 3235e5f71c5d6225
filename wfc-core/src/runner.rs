use crate::entropy::Heuristic;
use crate::model::OverlappingModel;
use crate::{BoundaryMode, WfcError};
use log::{info, warn};
use wfc_rules::CatalogOptions;

/// Configuration options for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfcConfig {
    pub width: usize,
    pub height: usize,
    pub pattern_size: usize,
    pub periodic_input: bool,
    pub boundary_mode: BoundaryMode,
    pub symmetry: usize,
    pub ground: bool,
    pub heuristic: Heuristic,
    /// Observation steps per attempt; `0` = unbounded.
    pub limit: usize,
    pub max_attempts: usize,
    pub seed: Option<u64>,
}

impl WfcConfig {
    /// Creates a new builder for `WfcConfig`.
    pub fn builder() -> WfcConfigBuilder {
        WfcConfigBuilder::default()
    }

    /// The extraction options this configuration implies.
    pub const fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            pattern_size: self.pattern_size,
            periodic_input: self.periodic_input,
            symmetry: self.symmetry,
        }
    }
}

impl Default for WfcConfig {
    fn default() -> Self {
        Self {
            width: 65,
            height: 65,
            pattern_size: 2,
            periodic_input: true,
            boundary_mode: BoundaryMode::Clamped,
            symmetry: 8,
            ground: false,
            heuristic: Heuristic::Entropy,
            limit: 0,
            max_attempts: 10,
            seed: None,
        }
    }
}

/// Builder for `WfcConfig`.
///
/// Allows for a more ergonomic construction of `WfcConfig` instances.
#[derive(Debug, Default)]
pub struct WfcConfigBuilder {
    config: WfcConfig,
}

impl WfcConfigBuilder {
    /// Sets the output (or chunk) dimensions.
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Sets the pattern side length N.
    pub fn pattern_size(mut self, n: usize) -> Self {
        self.config.pattern_size = n;
        self
    }

    pub fn periodic_input(mut self, periodic: bool) -> Self {
        self.config.periodic_input = periodic;
        self
    }

    /// Sets the boundary mode of the output.
    pub fn boundary_mode(mut self, mode: BoundaryMode) -> Self {
        self.config.boundary_mode = mode;
        self
    }

    /// Number of symmetry variants kept per sample anchor.
    pub fn symmetry(mut self, symmetry: usize) -> Self {
        self.config.symmetry = symmetry;
        self
    }

    /// Forces the last pattern along the bottom row.
    pub fn ground(mut self, ground: bool) -> Self {
        self.config.ground = ground;
        self
    }

    pub fn heuristic(mut self, heuristic: Heuristic) -> Self {
        self.config.heuristic = heuristic;
        self
    }

    /// Sets the maximum number of observation steps per attempt.
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Sets the retry budget.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Sets the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Builds the `WfcConfig` instance.
    pub fn build(self) -> WfcConfig {
        self.config
    }
}

/// Outcome of a successful [`run_with_retries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Attempts used, including the successful one.
    pub attempts: usize,
    /// Seed of the successful attempt.
    pub seed: u64,
}

const fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic per-attempt seed for the unit of work at `(x, y)`.
///
/// Identical inputs always give the same seed; changing any input scrambles it.
pub const fn attempt_seed(base: u64, x: i64, y: i64, attempt: usize) -> u64 {
    let mixed = splitmix64(base ^ x as u64);
    let mixed = splitmix64(mixed ^ y as u64);
    splitmix64(mixed ^ attempt as u64)
}

/// Runs `model` until an attempt succeeds or `max_attempts` attempts contradicted.
///
/// Presets registered on the model apply to every attempt. The result is not saved.
///
/// # Errors
///
/// Returns `WfcError::ConfigurationError` for a zero budget and
/// `WfcError::AttemptsExhausted` when every attempt contradicted.
pub fn run_with_retries(
    model: &mut OverlappingModel,
    base_seed: u64,
    limit: usize,
    max_attempts: usize,
) -> Result<RunReport, WfcError> {
    if max_attempts == 0 {
        return Err(WfcError::ConfigurationError(
            "At least one attempt is required".to_owned(),
        ));
    }
    for attempt in 0..max_attempts {
        let seed = attempt_seed(base_seed, 0, 0, attempt);
        if model.run(seed, limit) {
            info!("Generation succeeded on attempt {} (seed {seed})", attempt + 1);
            return Ok(RunReport {
                attempts: attempt + 1,
                seed,
            });
        }
        warn!("Failed attempt {} (seed {seed})", attempt + 1);
    }
    Err(WfcError::AttemptsExhausted(max_attempts))
}
