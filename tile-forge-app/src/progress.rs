//! Progress reporting for level and world runs.

use anyhow::Result;
use log::Level;
use std::time::{Duration, Instant};
use wfc_core::{ChunkOutcome, Point, RunReport, WfcError};

/// Trait for reporting generation progress.
///
/// Implementors of this trait can display progress information in various ways
/// (e.g., console output, a progress log).
pub trait ProgressReporter: Send {
    /// Called for every chunk the scheduler finished, whatever the outcome.
    fn chunk_completed(&mut self, origin: Point, outcome: ChunkOutcome) -> Result<()>;

    /// Called while waiting on the scheduler; implementations throttle themselves.
    fn report(&mut self, queued: usize) -> Result<()>;

    /// Called when a level solve succeeded.
    fn level_completed(&mut self, report: &RunReport) -> Result<()>;

    /// Called when the generation process completes.
    fn finish(&mut self) -> Result<()>;

    /// Called when the generation process fails with an error.
    fn fail(&mut self, error: &WfcError) -> Result<()>;
}

/// Running totals of chunk outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkTally {
    /// Chunks solved and painted, partial ones included.
    pub generated: usize,
    /// Generated chunks the step limit left with unpainted cells.
    pub partial: usize,
    /// Chunks found already painted.
    pub skipped: usize,
    /// Chunks abandoned after every attempt failed.
    pub failed: usize,
    /// Pattern sheets painted instead of solves.
    pub painted: usize,
    /// Solve attempts spent on generated and failed chunks.
    pub attempts: usize,
}

impl ChunkTally {
    /// Adds one completed chunk.
    pub fn record(&mut self, outcome: ChunkOutcome) {
        match outcome {
            ChunkOutcome::Generated { attempts, partial } => {
                self.generated += 1;
                self.partial += usize::from(partial);
                self.attempts += attempts;
            }
            ChunkOutcome::AlreadyGenerated => self.skipped += 1,
            ChunkOutcome::Failed { attempts } => {
                self.failed += 1;
                self.attempts += attempts;
            }
            ChunkOutcome::PatternsPainted => self.painted += 1,
        }
    }

    /// Chunks recorded so far, whatever their outcome.
    pub const fn completed(&self) -> usize {
        self.generated + self.skipped + self.failed + self.painted
    }
}

/// A `ProgressReporter` that logs status updates through this module's target.
pub struct ConsoleProgressReporter {
    start_time: Instant,
    last_report_time: Instant,
    report_interval: Option<Duration>,
    level: Level,
    total_chunks: usize,
    tally: ChunkTally,
}

impl ConsoleProgressReporter {
    /// Creates a new `ConsoleProgressReporter`.
    ///
    /// Without `report_interval` only completions and the final summary are logged.
    pub fn new(report_interval: Option<Duration>, level: Level, total_chunks: usize) -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_report_time: now,
            report_interval,
            level,
            total_chunks,
            tally: ChunkTally::default(),
        }
    }

    /// Outcomes recorded so far.
    pub const fn tally(&self) -> ChunkTally {
        self.tally
    }

    fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();
        format!("{secs}.{millis:03}s")
    }

    fn percentage(&self) -> f32 {
        if self.total_chunks > 0 {
            (self.tally.completed() as f32 / self.total_chunks as f32) * 100.0
        } else {
            100.0
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn chunk_completed(&mut self, origin: Point, outcome: ChunkOutcome) -> Result<()> {
        self.tally.record(outcome);
        log::log!(
            self.level,
            "Chunk {}/{} at {origin}: {:?} ({:.1}%)",
            self.tally.completed(),
            self.total_chunks,
            outcome,
            self.percentage()
        );
        Ok(())
    }

    fn report(&mut self, queued: usize) -> Result<()> {
        let Some(interval) = self.report_interval else {
            return Ok(());
        };
        let now = Instant::now();
        if now.duration_since(self.last_report_time) >= interval {
            log::log!(
                self.level,
                "Progress: {}/{} chunks ({:.1}%) | Queued: {queued} | Elapsed: {}",
                self.tally.completed(),
                self.total_chunks,
                self.percentage(),
                Self::format_duration(self.start_time.elapsed())
            );
            self.last_report_time = now;
        }
        Ok(())
    }

    fn level_completed(&mut self, report: &RunReport) -> Result<()> {
        log::log!(
            self.level,
            "Level solved after {} attempt(s) with seed {}",
            report.attempts,
            report.seed
        );
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let total_time = self.start_time.elapsed();
        if self.total_chunks > 0 {
            log::info!(
                "Generation finished: {} generated, {} skipped, {} failed, {} pattern sheets, {} partial in {}",
                self.tally.generated,
                self.tally.skipped,
                self.tally.failed,
                self.tally.painted,
                self.tally.partial,
                Self::format_duration(total_time)
            );
        } else {
            log::info!(
                "Generation finished. Total time: {}",
                Self::format_duration(total_time)
            );
        }
        Ok(())
    }

    fn fail(&mut self, error: &WfcError) -> Result<()> {
        log::error!(
            "Generation failed: {}. Total time: {}",
            error,
            Self::format_duration(self.start_time.elapsed())
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tally_counts_each_outcome() {
        let mut reporter = ConsoleProgressReporter::new(None, Level::Info, 4);
        let origin = Point::ORIGIN;
        reporter
            .chunk_completed(
                origin,
                ChunkOutcome::Generated {
                    attempts: 2,
                    partial: false,
                },
            )
            .unwrap();
        reporter
            .chunk_completed(origin, ChunkOutcome::AlreadyGenerated)
            .unwrap();
        reporter
            .chunk_completed(origin, ChunkOutcome::Failed { attempts: 3 })
            .unwrap();
        reporter
            .chunk_completed(
                origin,
                ChunkOutcome::Generated {
                    attempts: 1,
                    partial: true,
                },
            )
            .unwrap();
        let tally = reporter.tally();
        assert_eq!(tally.generated, 2);
        assert_eq!(tally.partial, 1);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.attempts, 6);
        assert_eq!(tally.completed(), 4);
        assert!((reporter.percentage() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_report_is_throttled() {
        let mut reporter =
            ConsoleProgressReporter::new(Some(Duration::from_millis(50)), Level::Debug, 1);
        let first = reporter.last_report_time;
        reporter.report(3).unwrap();
        // Too early: the timer is untouched.
        assert_eq!(reporter.last_report_time, first);

        thread::sleep(Duration::from_millis(60));
        reporter.report(2).unwrap();
        assert!(reporter.last_report_time > first);
    }

    #[test]
    fn test_zero_chunks() {
        let mut reporter = ConsoleProgressReporter::new(None, Level::Info, 0);
        assert!((reporter.percentage() - 100.0).abs() < f32::EPSILON);
        assert!(reporter.report(0).is_ok());
        assert!(reporter.finish().is_ok());
        assert!(reporter.fail(&WfcError::AttemptsExhausted(3)).is_ok());
    }
}
