//! Tile Forge Application Library
//!
//! This crate contains the configuration, logging, execution modes and
//! output handling for the Tile Forge command line tool.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod setup;
pub mod visualization;

// Only the binary's integration tests drive these.
#[cfg(test)]
use assert_cmd as _;
#[cfg(test)]
use predicates as _;

pub use config::{AppConfig, GenerationSettings};
pub use error::AppError;

use anyhow::{Context, Result};
use clap::Parser;
use config::{ProgressLogLevel, RunMode, VisualizationMode};
use progress::ConsoleProgressReporter;
use std::io;
use std::sync::Arc;
use visualization::{TerminalVisualizer, Visualizer};
use wfc_core::MemoryGrid;
use wfc_rules::loader::load_from_file;

const fn progress_level(level: ProgressLogLevel) -> log::Level {
    match level {
        ProgressLogLevel::Trace => log::Level::Trace,
        ProgressLogLevel::Debug => log::Level::Debug,
        ProgressLogLevel::Info => log::Level::Info,
        ProgressLogLevel::Warn => log::Level::Warn,
    }
}

/// Parses the command line and runs the selected mode.
pub fn run() -> Result<()> {
    let config = AppConfig::parse();
    logging::init_logger(&config);
    run_with_config(&config)
}

/// Runs the selected mode for an already parsed configuration.
pub fn run_with_config(config: &AppConfig) -> Result<()> {
    log::info!("Tile Forge starting");
    log::debug!("Loaded Config: {:?}", config);

    let settings = GenerationSettings::load(config)?;
    log::debug!("Generation settings: {:?}", settings);

    log::info!("Loading samples from: {:?}", config.sample_file);
    let samples = load_from_file(&config.sample_file)
        .with_context(|| format!("Failed to load samples from {:?}", config.sample_file))?;

    let seed = settings.seed.unwrap_or_else(rand::random);
    log::info!("Using seed {seed}");

    let sink = Arc::new(MemoryGrid::new());
    let level = progress_level(config.progress_log_level);
    let outcome = match config.mode {
        RunMode::Level => {
            let mut reporter = ConsoleProgressReporter::new(config.report_progress_interval, level, 0);
            setup::execution::run_level_mode(
                config,
                &settings,
                &samples,
                Arc::clone(&sink),
                seed,
                &mut reporter,
            )
        }
        RunMode::World => {
            let total = settings.chunks_x * settings.chunks_y;
            let mut reporter =
                ConsoleProgressReporter::new(config.report_progress_interval, level, total);
            setup::execution::run_world_mode(
                config,
                &settings,
                &samples,
                Arc::clone(&sink),
                seed,
                &mut reporter,
            )
            .and_then(|tally| match tally.failed {
                0 => Ok(()),
                failed => Err(AppError::IncompleteWorld { failed, total }),
            })
        }
    };

    // Failed chunks leave holes, but the rest of the world is still written.
    if outcome.is_ok() || matches!(outcome, Err(AppError::IncompleteWorld { .. })) {
        write_results(config, &sink)?;
    }
    outcome?;

    log::info!("Tile Forge finished.");
    Ok(())
}

fn write_results(config: &AppConfig, sink: &MemoryGrid) -> Result<()> {
    match &config.output_path {
        Some(path) => output::save_grid_to_file(sink, path)?,
        None if config.visualization_mode == VisualizationMode::None => {
            output::write_grid(sink, &mut io::stdout().lock())
                .context("Failed to write grid to stdout")?;
        }
        None => {}
    }
    if config.visualization_mode == VisualizationMode::Terminal {
        TerminalVisualizer::new().display_state(sink)?;
    }
    Ok(())
}
