//! Core library for the overlapping Wave Function Collapse model.
//! Defines the solver, the sample-bound model and the chunk scheduler that
//! drives it across an unbounded world.

#[cfg(feature = "serde")] // Guard serde imports
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wfc_rules::CatalogError;

/// Cell selection heuristics.
pub mod entropy;
/// Row-major 2D grids and world positions.
pub mod grid;
/// The overlapping model: catalog, solver and sink bound together.
pub mod model;
/// Run configuration and retry handling.
pub mod runner;
/// Background chunk generation.
pub mod scheduler;
/// Output sinks.
pub mod sink;
/// The constraint engine.
pub mod solver;

pub use crate::entropy::Heuristic;
pub use crate::grid::{Grid, Point, PossibilityGrid};
pub use crate::model::OverlappingModel;
pub use crate::runner::{attempt_seed, run_with_retries, RunReport, WfcConfig, WfcConfigBuilder};
pub use crate::scheduler::{ChunkOutcome, ChunkScheduler, SchedulerConfig, SchedulerEvent};
pub use crate::sink::{GridSink, MemoryGrid};
pub use crate::solver::{NoPreBan, PreBan, WaveSolver};

/// Errors that can occur while building or driving a Wave Function Collapse model.
#[derive(Error, Debug)]
pub enum WfcError {
    /// An error related to invalid configuration (e.g., output size, weights).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// The pattern catalog could not be built from the samples.
    #[error("Pattern catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// Every attempt ended in a contradiction.
    #[error("All {0} attempts ended in a contradiction")]
    AttemptsExhausted(usize),
    /// The chunk queue is at capacity.
    #[error("Chunk queue is full ({0} entries)")]
    QueueFull(usize),
    /// The scheduler worker is no longer running.
    #[error("Chunk scheduler has stopped")]
    SchedulerStopped,
    /// The scheduler worker thread could not be started.
    #[error("Failed to start chunk worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Defines different boundary handling strategies for the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BoundaryMode {
    /// Edges wrap around (toroidal topology).
    Periodic,
    /// Patterns must fit inside the grid; neighbours past the last full anchor are ignored.
    #[default]
    Clamped,
}
