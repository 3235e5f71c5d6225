//! Handles the core execution logic for level and world modes.

use crate::config::{AppConfig, GenerationSettings};
use crate::error::AppError;
use crate::progress::{ChunkTally, ProgressReporter};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wfc_core::{
    run_with_retries, ChunkScheduler, GridSink, MemoryGrid, OverlappingModel, Point,
    SchedulerEvent, WfcError,
};
use wfc_rules::SampleSet;

/// Longest single wait for a scheduler event before progress is reported.
const EVENT_WAIT: Duration = Duration::from_millis(250);

/// Builds the model for `settings`, painting into `sink`.
pub fn build_model(
    samples: &SampleSet,
    settings: &GenerationSettings,
    sink: Arc<MemoryGrid>,
) -> Result<OverlappingModel, AppError> {
    let sink: Arc<dyn GridSink> = sink;
    let model = OverlappingModel::new(
        &samples.sources(),
        &samples.symmetry,
        sink,
        &settings.wfc_config(),
    )?;
    Ok(model)
}

/// Generates one bounded grid at the origin, retrying until an attempt succeeds.
pub fn run_level_mode(
    config: &AppConfig,
    settings: &GenerationSettings,
    samples: &SampleSet,
    sink: Arc<MemoryGrid>,
    seed: u64,
    reporter: &mut dyn ProgressReporter,
) -> Result<(), AppError> {
    info!("Running level mode...");
    let mut model = build_model(samples, settings, sink)?;

    if config.show_patterns {
        let painted = model.save_patterns(Point::ORIGIN);
        info!(
            "Painted {} patterns ({painted} cells)",
            model.catalog().len()
        );
        reporter.finish()?;
        return Ok(());
    }

    match run_with_retries(&mut model, seed, settings.limit, settings.max_attempts) {
        Ok(report) => {
            reporter.level_completed(&report)?;
            if !model.save_default() {
                warn!("Step limit reached before every cell was resolved; partial output saved");
            }
            reporter.finish()?;
            Ok(())
        }
        Err(e) => {
            reporter.fail(&e)?;
            Err(e.into())
        }
    }
}

/// Chunk origins of a `chunks_x` by `chunks_y` block, row by row.
pub fn world_origins(chunks_x: usize, chunks_y: usize, spacing: (usize, usize)) -> Vec<Point> {
    (0..chunks_y)
        .flat_map(|cy| {
            (0..chunks_x).map(move |cx| Point::ORIGIN.offset(cx * spacing.0, cy * spacing.1))
        })
        .collect()
}

/// Generates a block of chunks through the background scheduler.
///
/// Requests are placed inside each chunk's interior so no neighbour outside the
/// block is pulled in. Returns the outcome tally once every chunk completed.
pub fn run_world_mode(
    config: &AppConfig,
    settings: &GenerationSettings,
    samples: &SampleSet,
    sink: Arc<MemoryGrid>,
    seed: u64,
    reporter: &mut dyn ProgressReporter,
) -> Result<ChunkTally, AppError> {
    info!(
        "Running world mode: {}x{} chunks of {}x{}",
        settings.chunks_x, settings.chunks_y, settings.width, settings.height
    );
    let model = build_model(samples, settings, sink)?;
    let scheduler_config = settings.scheduler_config(config, seed);
    let overlap = settings.pattern_size.saturating_sub(1);
    let (spacing_x, spacing_y) = (scheduler_config.spacing_x, scheduler_config.spacing_y);
    let inset = (
        overlap.min(spacing_x.saturating_sub(1)),
        overlap.min(spacing_y.saturating_sub(1)),
    );
    let origins = world_origins(settings.chunks_x, settings.chunks_y, (spacing_x, spacing_y));
    let mut scheduler = ChunkScheduler::spawn(model, scheduler_config)?;

    for origin in &origins {
        scheduler.generate_level(origin.offset(inset.0, inset.1))?;
    }

    let mut remaining: HashSet<Point> = origins.iter().copied().collect();
    let mut tally = ChunkTally::default();
    while !remaining.is_empty() {
        match scheduler.next_event(EVENT_WAIT) {
            Some(SchedulerEvent::ChunkCompleted { origin, outcome }) => {
                remaining.remove(&origin);
                tally.record(outcome);
                reporter.chunk_completed(origin, outcome)?;
            }
            Some(SchedulerEvent::LevelCompleted) => debug!("Scheduler reported level completion"),
            None if !scheduler.is_running() => {
                let error = WfcError::SchedulerStopped;
                reporter.fail(&error)?;
                return Err(error.into());
            }
            None => reporter.report(scheduler.queued())?,
        }
    }

    scheduler.shutdown();
    reporter.finish()?;
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_row_major() {
        let origins = world_origins(2, 2, (8, 6));
        assert_eq!(
            origins,
            vec![
                Point::new(0, 0),
                Point::new(8, 0),
                Point::new(0, 6),
                Point::new(8, 6)
            ]
        );
    }
}
