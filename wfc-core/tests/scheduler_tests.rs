// wfc-core/tests/scheduler_tests.rs
mod common;

use common::{build_model, chunk_config, init_logging, BLOBS, STRIPES};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wfc_core::{
    BoundaryMode, ChunkOutcome, ChunkScheduler, GridSink, MemoryGrid, Point, SchedulerConfig,
    SchedulerEvent, WfcConfig, WfcError,
};
use wfc_rules::TileId;

const EVENT_TIMEOUT: Duration = Duration::from_secs(60);

fn fast_config(config: &WfcConfig) -> SchedulerConfig {
    SchedulerConfig {
        idle_poll: Duration::from_millis(10),
        busy_poll: Duration::from_millis(1),
        ..SchedulerConfig::from_config(config)
    }
}

/// Collects events until the level completes.
fn drain_level(scheduler: &ChunkScheduler) -> Vec<(Point, ChunkOutcome)> {
    let mut completed = Vec::new();
    while let Some(event) = scheduler.next_event(EVENT_TIMEOUT) {
        match event {
            SchedulerEvent::ChunkCompleted { origin, outcome } => completed.push((origin, outcome)),
            SchedulerEvent::LevelCompleted => return completed,
        }
    }
    panic!("scheduler went quiet before the level completed: {completed:?}");
}

#[test]
fn spacing_defaults_to_chunk_size_minus_overlap() {
    let config = SchedulerConfig::from_config(&chunk_config());
    assert_eq!((config.spacing_x, config.spacing_y), (8, 8));
    assert_eq!(config.max_attempts, 10);
    assert_eq!(config.idle_poll, Duration::from_secs(1));
    assert_eq!(config.busy_poll, Duration::from_millis(20));
}

#[test]
fn chunk_origin_rounds_towards_negative_infinity() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let scheduler =
        ChunkScheduler::spawn(build_model(&BLOBS, &config, &sink), fast_config(&config)).unwrap();
    assert_eq!(scheduler.chunk_origin(Point::new(-1, -9)), Point::new(-8, -16));
    assert_eq!(scheduler.chunk_origin(Point::new(15, 8)), Point::new(8, 8));
}

#[test]
fn level_generation_produces_seamless_chunks() {
    init_logging();
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let mut scheduler =
        ChunkScheduler::spawn(build_model(&BLOBS, &config, &sink), fast_config(&config)).unwrap();

    // (8, 8) sits on the corner shared by four chunks.
    scheduler.generate_level(Point::new(8, 8)).unwrap();
    let completed = drain_level(&scheduler);

    let origins: Vec<Point> = completed.iter().map(|(origin, _)| *origin).collect();
    assert_eq!(
        origins,
        vec![
            Point::new(0, 0),
            Point::new(8, 0),
            Point::new(0, 8),
            Point::new(8, 8)
        ]
    );
    for (origin, outcome) in &completed {
        assert!(
            matches!(outcome, ChunkOutcome::Generated { partial: false, .. }),
            "chunk {origin} ended with {outcome:?}"
        );
    }
    assert_eq!(sink.len(), 17 * 17);

    // Every 2x2 window of the world, seams included, is a sample pattern.
    let model = scheduler.shutdown().unwrap();
    let catalog = model.catalog();
    let known: HashSet<Vec<TileId>> = catalog
        .patterns()
        .iter()
        .map(|p| {
            p.cells()
                .iter()
                .map(|&c| catalog.dictionary().tile(c).unwrap())
                .collect()
        })
        .collect();
    for y in 0..16 {
        for x in 0..16 {
            let window: Vec<TileId> = [(0, 0), (1, 0), (0, 1), (1, 1)]
                .iter()
                .map(|&(dx, dy)| sink.read(Point::new(x + dx, y + dy)).unwrap())
                .collect();
            assert!(known.contains(&window), "window at ({x}, {y}) is not a sample pattern");
        }
    }
}

#[test]
fn painted_chunks_are_skipped() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let scheduler =
        ChunkScheduler::spawn(build_model(&BLOBS, &config, &sink), fast_config(&config)).unwrap();

    scheduler.generate_level(Point::new(3, 3)).unwrap();
    let first = drain_level(&scheduler);
    assert_eq!(first.len(), 1);

    let painted = sink.len();
    scheduler.generate_level(Point::new(4, 4)).unwrap();
    let second = drain_level(&scheduler);
    assert_eq!(second, vec![(Point::ORIGIN, ChunkOutcome::AlreadyGenerated)]);
    assert_eq!(sink.len(), painted);
}

#[test]
fn level_waits_for_chunks_requested_while_in_flight() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let scheduler =
        ChunkScheduler::spawn(build_model(&BLOBS, &config, &sink), fast_config(&config)).unwrap();

    scheduler.enqueue(Point::new(3, 3)).unwrap();
    while scheduler.queued() > 0 {
        std::thread::sleep(Duration::from_millis(1));
    }
    // The untracked copy is in flight; the level is the copy queued now.
    scheduler.generate_level(Point::new(3, 3)).unwrap();
    let completed = drain_level(&scheduler);
    assert_eq!(completed.len(), 2, "{completed:?}");
    assert!(matches!(completed[0], (Point::ORIGIN, ChunkOutcome::Generated { .. })));
    assert_eq!(completed[1], (Point::ORIGIN, ChunkOutcome::AlreadyGenerated));
}

#[test]
fn step_limit_marks_chunks_partial() {
    let sink = Arc::new(MemoryGrid::new());
    // Single-cell patterns never constrain each other, so one step decides one cell.
    let config = WfcConfig::builder()
        .size(4, 4)
        .pattern_size(1)
        .symmetry(1)
        .boundary_mode(BoundaryMode::Clamped)
        .build();
    let scheduler = ChunkScheduler::spawn(
        build_model(&["#."], &config, &sink),
        SchedulerConfig {
            limit: 1,
            ..fast_config(&config)
        },
    )
    .unwrap();

    scheduler.generate_level(Point::new(1, 1)).unwrap();
    let completed = drain_level(&scheduler);
    assert_eq!(
        completed,
        vec![(
            Point::ORIGIN,
            ChunkOutcome::Generated {
                attempts: 1,
                partial: true
            }
        )]
    );
    assert_eq!(sink.len(), 1);
}

#[test]
fn exhausted_chunks_are_reported_and_left_unpainted() {
    let sink = Arc::new(MemoryGrid::new());
    sink.write(Point::new(0, 0), TileId::from_char('#'));
    sink.write(Point::new(1, 0), TileId::from_char('#'));
    let config = WfcConfig::builder()
        .size(4, 4)
        .pattern_size(2)
        .symmetry(1)
        .boundary_mode(BoundaryMode::Clamped)
        .max_attempts(2)
        .build();
    let scheduler =
        ChunkScheduler::spawn(build_model(&STRIPES, &config, &sink), fast_config(&config)).unwrap();

    scheduler.generate_level(Point::new(2, 2)).unwrap();
    let completed = drain_level(&scheduler);
    assert_eq!(
        completed,
        vec![(Point::ORIGIN, ChunkOutcome::Failed { attempts: 2 })]
    );
    assert_eq!(sink.len(), 2);
}

#[test]
fn show_patterns_paints_the_catalog() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let model = build_model(&BLOBS, &config, &sink);
    let cells = model.catalog().len() * 4;
    let scheduler = ChunkScheduler::spawn(
        model,
        SchedulerConfig {
            show_patterns: true,
            ..fast_config(&config)
        },
    )
    .unwrap();

    scheduler.enqueue(Point::new(5, 5)).unwrap();
    let event = scheduler.next_event(EVENT_TIMEOUT);
    assert_eq!(
        event,
        Some(SchedulerEvent::ChunkCompleted {
            origin: Point::ORIGIN,
            outcome: ChunkOutcome::PatternsPainted
        })
    );
    assert_eq!(sink.len(), cells);
}

#[test]
fn requests_on_a_left_edge_queue_the_left_neighbour_first() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let scheduler = ChunkScheduler::spawn(
        build_model(&BLOBS, &config, &sink),
        SchedulerConfig {
            show_patterns: true,
            ..fast_config(&config)
        },
    )
    .unwrap();

    scheduler.generate_level(Point::new(-8, 3)).unwrap();
    let origins: Vec<Point> = drain_level(&scheduler).into_iter().map(|(o, _)| o).collect();
    assert_eq!(origins, vec![Point::new(-16, 0), Point::new(-8, 0)]);
}

#[test]
fn undelivered_completion_keeps_the_worker_idle() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let scheduler = ChunkScheduler::spawn(
        build_model(&BLOBS, &config, &sink),
        SchedulerConfig {
            show_patterns: true,
            queue_capacity: 4,
            ..fast_config(&config)
        },
    )
    .unwrap();

    // Nothing is pumped, so at most one chunk leaves the queue.
    let results: Vec<_> = (0..6).map(|_| scheduler.enqueue(Point::new(3, 3))).collect();
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(WfcError::QueueFull(4)))));
    assert!(scheduler.queued() >= 3);

    let events = loop {
        let events = scheduler.pump();
        if !events.is_empty() {
            break events;
        }
        std::thread::sleep(Duration::from_millis(5));
    };
    assert_eq!(events.len(), 1);
}

#[test]
fn requests_after_shutdown_are_rejected() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let mut scheduler =
        ChunkScheduler::spawn(build_model(&BLOBS, &config, &sink), fast_config(&config)).unwrap();
    assert!(scheduler.is_running());
    assert!(scheduler.shutdown().is_some());
    assert!(!scheduler.is_running());
    assert!(scheduler.shutdown().is_none());
    assert!(matches!(
        scheduler.enqueue(Point::ORIGIN),
        Err(WfcError::SchedulerStopped)
    ));
}

#[test]
fn zero_spacing_is_rejected() {
    let sink = Arc::new(MemoryGrid::new());
    let config = chunk_config();
    let result = ChunkScheduler::spawn(
        build_model(&BLOBS, &config, &sink),
        SchedulerConfig {
            spacing_x: 0,
            ..fast_config(&config)
        },
    );
    assert!(matches!(result, Err(WfcError::ConfigurationError(_))));
    // The sink is untouched by a scheduler that never started.
    assert!(sink.read(Point::ORIGIN).is_none());
}
