//! Background generation of an unbounded world, one chunk at a time.
//!
//! A single worker thread owns the [`OverlappingModel`]. Callers enqueue world
//! positions; the worker solves the containing chunk under the borders already
//! painted by its neighbours and reports back over a channel that the consuming
//! side drains with [`ChunkScheduler::pump`] or [`ChunkScheduler::next_event`].
//!
//! At most one chunk is in flight: the worker raises the in-flight flag before
//! solving and only the consumer lowers it, when it receives the matching
//! [`SchedulerEvent::ChunkCompleted`].

use crate::grid::Point;
use crate::model::OverlappingModel;
use crate::runner::{attempt_seed, WfcConfig};
use crate::WfcError;
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default bound on queued chunk requests.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// One entry point can queue at most this many chunks (itself plus three neighbours).
const MAX_CHUNKS_PER_REQUEST: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Horizontal distance between chunk origins.
    pub spacing_x: usize,
    /// Vertical distance between chunk origins.
    pub spacing_y: usize,
    /// Solve attempts per chunk before it is abandoned.
    pub max_attempts: usize,
    /// Observation steps per attempt; `0` = unbounded.
    pub limit: usize,
    /// Base of every per-chunk attempt seed.
    pub world_seed: u64,
    pub queue_capacity: usize,
    /// Wait between queue checks while the queue is empty.
    pub idle_poll: Duration,
    /// Wait between checks while a completed chunk awaits the consumer.
    pub busy_poll: Duration,
    /// Paint the pattern catalog instead of solving.
    pub show_patterns: bool,
}

impl SchedulerConfig {
    /// Defaults for chunks of the configured output size.
    ///
    /// Chunks overlap by N-1 cells, the band every pattern anchor shares with
    /// its neighbour.
    pub fn from_config(config: &WfcConfig) -> Self {
        let overlap = config.pattern_size.saturating_sub(1);
        Self {
            spacing_x: config.width.saturating_sub(overlap),
            spacing_y: config.height.saturating_sub(overlap),
            max_attempts: config.max_attempts,
            limit: config.limit,
            world_seed: config.seed.unwrap_or(0),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            idle_poll: Duration::from_secs(1),
            busy_poll: Duration::from_millis(20),
            show_patterns: false,
        }
    }
}

/// What happened to one dequeued chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Solved and painted.
    ///
    /// `partial` is set when the step limit stopped the solve early and some
    /// cells were left unpainted.
    Generated { attempts: usize, partial: bool },
    /// Its interior was painted already; nothing was done.
    AlreadyGenerated,
    /// Every attempt contradicted; the chunk stays unpainted.
    Failed { attempts: usize },
    /// The pattern catalog was painted instead of a solve.
    PatternsPainted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    ChunkCompleted { origin: Point, outcome: ChunkOutcome },
    /// Every chunk tracked by [`ChunkScheduler::generate_level`] has completed.
    LevelCompleted,
}

#[derive(Debug, Clone, Copy)]
struct QueuedChunk {
    origin: Point,
    /// Queued by [`ChunkScheduler::generate_level`].
    tracked: bool,
}

#[derive(Debug, Default)]
struct ChunkQueue {
    queue: VecDeque<QueuedChunk>,
    /// Tracked entries that are queued or in flight.
    pending: usize,
    stopped: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<ChunkQueue>,
    wake: Condvar,
    in_flight: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ChunkQueue> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, ChunkQueue>, timeout: Duration) -> MutexGuard<'a, ChunkQueue> {
        match self.wake.wait_timeout(guard, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

/// Drives an [`OverlappingModel`] from a background worker.
#[derive(Debug)]
pub struct ChunkScheduler {
    shared: Arc<Shared>,
    events: Receiver<SchedulerEvent>,
    worker: Option<JoinHandle<OverlappingModel>>,
    spacing_x: i64,
    spacing_y: i64,
    overlap: i64,
    queue_capacity: usize,
}

impl ChunkScheduler {
    /// Moves `model` onto a new worker thread.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::ConfigurationError` for zero spacing, attempt budget or
    /// queue capacity, and `WfcError::WorkerSpawn` if the thread cannot start.
    pub fn spawn(model: OverlappingModel, config: SchedulerConfig) -> Result<Self, WfcError> {
        if config.spacing_x == 0 || config.spacing_y == 0 {
            return Err(WfcError::ConfigurationError(
                "Chunk spacing must be non-zero".to_owned(),
            ));
        }
        if config.max_attempts == 0 {
            return Err(WfcError::ConfigurationError(
                "At least one attempt per chunk is required".to_owned(),
            ));
        }
        if config.queue_capacity < MAX_CHUNKS_PER_REQUEST {
            return Err(WfcError::ConfigurationError(format!(
                "Queue capacity must be at least {MAX_CHUNKS_PER_REQUEST}"
            )));
        }
        let overlap = model.catalog().pattern_size() - 1;
        if config.spacing_x + overlap > model.width() || config.spacing_y + overlap > model.height() {
            warn!(
                "Chunk spacing {}x{} leaves gaps between {}x{} chunks; seams are unconstrained",
                config.spacing_x,
                config.spacing_y,
                model.width(),
                model.height()
            );
        }

        let shared = Arc::new(Shared::default());
        let (tx, rx) = mpsc::channel();
        let spacing_x = config.spacing_x as i64;
        let spacing_y = config.spacing_y as i64;
        let queue_capacity = config.queue_capacity;
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("chunk-worker".to_owned())
            .spawn(move || worker_loop(model, &config, &worker_shared, &tx))?;
        info!("Chunk scheduler started ({spacing_x}x{spacing_y} spacing)");

        Ok(Self {
            shared,
            events: rx,
            worker: Some(worker),
            spacing_x,
            spacing_y,
            overlap: overlap as i64,
            queue_capacity,
        })
    }

    /// Origin of the chunk containing `position`.
    pub const fn chunk_origin(&self, position: Point) -> Point {
        Point::new(
            position.x.div_euclid(self.spacing_x) * self.spacing_x,
            position.y.div_euclid(self.spacing_y) * self.spacing_y,
        )
    }

    /// Chunks to queue for `position`, neighbours first.
    ///
    /// A position inside the overlap band along a chunk's left or top edge is
    /// shared with the chunk to the left, above, or both (and the diagonal one).
    fn plan(&self, position: Point) -> Vec<Point> {
        let origin = self.chunk_origin(position);
        let on_left = position.x - origin.x < self.overlap;
        let on_top = position.y - origin.y < self.overlap;
        let left = Point::new(origin.x - self.spacing_x, origin.y);
        let top = Point::new(origin.x, origin.y - self.spacing_y);
        let top_left = Point::new(origin.x - self.spacing_x, origin.y - self.spacing_y);

        let mut chunks = Vec::with_capacity(MAX_CHUNKS_PER_REQUEST);
        if on_left && on_top {
            chunks.push(top_left);
        }
        if on_top {
            chunks.push(top);
        }
        if on_left {
            chunks.push(left);
        }
        chunks.push(origin);
        chunks
    }

    fn push(&self, position: Point, track_level: bool) -> Result<(), WfcError> {
        let chunks = self.plan(position);
        let mut state = self.shared.lock();
        if state.stopped {
            return Err(WfcError::SchedulerStopped);
        }
        if state.queue.len() + chunks.len() > self.queue_capacity {
            return Err(WfcError::QueueFull(self.queue_capacity));
        }
        if track_level {
            state.pending += chunks.len();
        }
        debug!("Queued {} chunk(s) for {position}", chunks.len());
        state.queue.extend(chunks.into_iter().map(|origin| QueuedChunk {
            origin,
            tracked: track_level,
        }));
        drop(state);
        self.shared.wake.notify_all();
        Ok(())
    }

    /// Queues the chunk containing `position`, after any neighbour sharing it.
    ///
    /// Duplicates are accepted; the worker skips chunks that are already painted.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::QueueFull` without queuing anything when the request does
    /// not fit, or `WfcError::SchedulerStopped` after shutdown.
    pub fn enqueue(&self, position: Point) -> Result<(), WfcError> {
        self.push(position, false)
    }

    /// Like [`Self::enqueue`], and additionally tracks the queued chunks so a
    /// [`SchedulerEvent::LevelCompleted`] fires once all of them completed.
    ///
    /// Only the entries queued here count. A chunk already in flight when this
    /// is called does not complete the level; its queued copy does.
    ///
    /// # Errors
    ///
    /// See [`Self::enqueue`].
    pub fn generate_level(&self, position: Point) -> Result<(), WfcError> {
        self.push(position, true)
    }

    /// Chunks waiting in the queue, not counting the one being solved.
    pub fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Whether the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Whether a chunk is being solved or awaits delivery of its completion.
    pub fn is_busy(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    fn delivered(&self, event: &SchedulerEvent) {
        if matches!(event, SchedulerEvent::ChunkCompleted { .. }) {
            self.shared.in_flight.store(false, Ordering::Release);
            self.shared.wake.notify_all();
        }
    }

    /// Drains every event that is ready without blocking.
    pub fn pump(&self) -> Vec<SchedulerEvent> {
        let events: Vec<_> = self.events.try_iter().collect();
        for event in &events {
            self.delivered(event);
        }
        events
    }

    /// Waits up to `timeout` for the next event.
    ///
    /// Returns `None` on timeout or once the worker has exited.
    pub fn next_event(&self, timeout: Duration) -> Option<SchedulerEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.delivered(&event);
                Some(event)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stops the worker between chunks and hands the model back.
    ///
    /// A chunk being solved runs to completion first. Returns `None` if the worker
    /// was already joined or panicked.
    pub fn shutdown(&mut self) -> Option<OverlappingModel> {
        let worker = self.worker.take()?;
        self.shared.lock().stopped = true;
        self.shared.wake.notify_all();
        match worker.join() {
            Ok(model) => {
                info!("Chunk scheduler stopped");
                Some(model)
            }
            Err(_) => {
                error!("Chunk worker panicked");
                None
            }
        }
    }
}

impl Drop for ChunkScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    mut model: OverlappingModel,
    config: &SchedulerConfig,
    shared: &Shared,
    events: &Sender<SchedulerEvent>,
) -> OverlappingModel {
    loop {
        let QueuedChunk { origin, tracked } = {
            let mut state = shared.lock();
            loop {
                if state.stopped {
                    return model;
                }
                if shared.in_flight.load(Ordering::Acquire) {
                    state = shared.wait(state, config.busy_poll);
                    continue;
                }
                if let Some(entry) = state.queue.pop_front() {
                    break entry;
                }
                state = shared.wait(state, config.idle_poll);
            }
        };

        shared.in_flight.store(true, Ordering::Release);
        let outcome = generate_chunk(&mut model, config, origin);

        let level_completed = tracked && {
            let mut state = shared.lock();
            state.pending = state.pending.saturating_sub(1);
            state.pending == 0
        };

        if events
            .send(SchedulerEvent::ChunkCompleted { origin, outcome })
            .is_err()
        {
            debug!("Event receiver dropped, stopping chunk worker");
            return model;
        }
        if level_completed {
            info!("Level completed");
            if events.send(SchedulerEvent::LevelCompleted).is_err() {
                return model;
            }
        }
    }
}

fn generate_chunk(
    model: &mut OverlappingModel,
    config: &SchedulerConfig,
    origin: Point,
) -> ChunkOutcome {
    // Checking the interior avoids the bands neighbours have already painted.
    if model.is_generated(origin) {
        debug!("Chunk {origin} already generated");
        return ChunkOutcome::AlreadyGenerated;
    }
    if config.show_patterns {
        let painted = model.save_patterns(origin);
        debug!("Painted {painted} pattern cells at {origin}");
        return ChunkOutcome::PatternsPainted;
    }

    model.register_preset_tiles(origin);
    for attempt in 0..config.max_attempts {
        let seed = attempt_seed(config.world_seed, origin.x, origin.y, attempt);
        if model.run(seed, config.limit) {
            let partial = !model.save(origin);
            if partial {
                warn!("Chunk {origin} hit the step limit; unresolved cells left unpainted");
            }
            info!("Chunk {origin} generated on attempt {}", attempt + 1);
            return ChunkOutcome::Generated {
                attempts: attempt + 1,
                partial,
            };
        }
        warn!("Chunk {origin}: failed attempt {}", attempt + 1);
    }
    error!(
        "Chunk {origin} abandoned after {} attempts",
        config.max_attempts
    );
    ChunkOutcome::Failed {
        attempts: config.max_attempts,
    }
}
