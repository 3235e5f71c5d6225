//! Command-line flags and layered generation settings.

use crate::error::AppError;
use clap::{Args, Parser, ValueEnum};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wfc_core::{BoundaryMode, Heuristic, SchedulerConfig, WfcConfig};

/// Prefix of environment variables that override generation settings.
pub const ENV_PREFIX: &str = "TILE_FORGE_";

/// What the application generates.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// One bounded grid, retried until it succeeds.
    #[default]
    Level,
    /// A block of chunks generated by the background scheduler.
    World,
}

/// Represents the different visualization modes available.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VisualizationMode {
    /// No preview.
    #[default]
    None,
    /// Coloured text preview after generation.
    Terminal,
}

/// Log level for progress reports.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

/// Default log level for everything else.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Configuration for the Tile Forge application.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Path to the RON or JSON sample file.
    #[arg(short, long, value_name = "FILE")]
    pub sample_file: PathBuf,

    /// Optional TOML file with generation settings.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a single level or a block of world chunks.
    #[arg(long, value_enum, default_value_t = RunMode::Level)]
    pub mode: RunMode,

    /// Paint the extracted patterns instead of solving.
    #[arg(long, default_value_t = false)]
    pub show_patterns: bool,

    /// Path to save the generated grid. Printed to stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Report progress every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub report_progress_interval: Option<Duration>,

    /// Wait between queue checks while the chunk queue is empty.
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration, default_value = "1s")]
    pub idle_poll: Duration,

    /// Wait between checks while a finished chunk awaits delivery.
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration, default_value = "20ms")]
    pub busy_poll: Duration,

    /// Choose the visualization mode.
    #[arg(long, value_enum, default_value_t = VisualizationMode::None)]
    pub visualization_mode: VisualizationMode,

    /// Log level for progress reports.
    #[arg(long, value_enum, default_value_t = ProgressLogLevel::Info)]
    pub progress_log_level: ProgressLogLevel,

    /// Default log level; `RUST_LOG` takes precedence.
    #[arg(long, value_enum, default_value_t = GlobalLogLevel::Info)]
    pub global_log_level: GlobalLogLevel,

    /// Generation settings given on the command line.
    #[command(flatten)]
    pub overrides: SettingsOverrides,
}

/// Generation settings after layering defaults, file, environment and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Output width, or chunk width in world mode.
    pub width: usize,
    /// Output height, or chunk height in world mode.
    pub height: usize,
    /// Pattern side length N.
    pub pattern_size: usize,
    /// Whether patterns wrap around the sample edges.
    pub periodic_input: bool,
    /// Whether the output wraps around.
    pub boundary_mode: BoundaryMode,
    /// Symmetry variants kept per sample anchor.
    pub symmetry: usize,
    /// Pin the last sample pattern to the bottom row.
    pub ground: bool,
    /// Cell selection strategy.
    pub heuristic: Heuristic,
    /// Observation steps per attempt; `0` = unbounded.
    pub limit: usize,
    /// Attempts per level or chunk.
    pub max_attempts: usize,
    /// Fixed seed; a random one is drawn when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// World mode: chunks per row.
    pub chunks_x: usize,
    /// World mode: chunk rows.
    pub chunks_y: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let core = WfcConfig::default();
        Self {
            width: core.width,
            height: core.height,
            pattern_size: core.pattern_size,
            periodic_input: core.periodic_input,
            boundary_mode: core.boundary_mode,
            symmetry: core.symmetry,
            ground: core.ground,
            heuristic: core.heuristic,
            limit: core.limit,
            max_attempts: core.max_attempts,
            seed: core.seed,
            chunks_x: 2,
            chunks_y: 2,
        }
    }
}

/// Command-line flags that take precedence over every other settings layer.
///
/// Unset flags are skipped when serialized, so they leave lower layers alone.
#[derive(Args, Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    /// Width of the output grid (one chunk in world mode).
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,

    /// Height of the output grid (one chunk in world mode).
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,

    /// Side length N of the extracted patterns.
    #[arg(short = 'n', long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_size: Option<usize>,

    /// Whether patterns may wrap around the sample edges.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodic_input: Option<bool>,

    /// Whether the output wraps around.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_mode: Option<BoundaryMode>,

    /// Symmetry variants kept per sample anchor (1 to 8).
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symmetry: Option<usize>,

    /// Pin the last sample pattern to the bottom row.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground: Option<bool>,

    /// Cell selection strategy.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heuristic: Option<Heuristic>,

    /// Observation steps per attempt; `0` = unbounded.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Attempts per level or chunk before giving up.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<usize>,

    /// Optional seed for the random number generator.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// World mode: chunks per row.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_x: Option<usize>,

    /// World mode: chunk rows.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_y: Option<usize>,
}

impl GenerationSettings {
    /// Layers struct defaults, the optional TOML file, `TILE_FORGE_*`
    /// environment variables and explicit flags, in that order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Settings` if a layer cannot be read or does not match
    /// the settings shape, and `AppError::Config` for an empty world.
    pub fn load(config: &AppConfig) -> Result<Self, AppError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = &config.config {
            log::info!("Reading generation settings from {:?}", path);
            figment = figment.merge(Toml::file(path));
        }
        let settings: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(&config.overrides))
            .extract()
            .map_err(Box::new)?;

        if settings.chunks_x == 0 || settings.chunks_y == 0 {
            return Err(AppError::Config(format!(
                "World must be at least one chunk, got {}x{}",
                settings.chunks_x, settings.chunks_y
            )));
        }
        Ok(settings)
    }

    /// Core configuration for one level or one chunk.
    pub fn wfc_config(&self) -> WfcConfig {
        let builder = WfcConfig::builder()
            .size(self.width, self.height)
            .pattern_size(self.pattern_size)
            .periodic_input(self.periodic_input)
            .boundary_mode(self.boundary_mode)
            .symmetry(self.symmetry)
            .ground(self.ground)
            .heuristic(self.heuristic)
            .limit(self.limit)
            .max_attempts(self.max_attempts);
        match self.seed {
            Some(seed) => builder.seed(seed),
            None => builder,
        }
        .build()
    }

    /// Scheduler configuration for world mode.
    pub fn scheduler_config(&self, app: &AppConfig, seed: u64) -> SchedulerConfig {
        SchedulerConfig {
            world_seed: seed,
            idle_poll: app.idle_poll,
            busy_poll: app.busy_poll,
            show_patterns: app.show_patterns,
            ..SchedulerConfig::from_config(&self.wfc_config())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_basic_args() {
        let args = vec![
            "tile-forge",
            "--sample-file",
            "samples.ron",
            "--width",
            "20",
            "--output-path",
            "out.txt",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.sample_file, PathBuf::from("samples.ron"));
        assert_eq!(config.overrides.width, Some(20));
        assert_eq!(config.overrides.height, None);
        assert_eq!(config.output_path, Some(PathBuf::from("out.txt")));
        assert_eq!(config.mode, RunMode::Level);
        assert!(!config.show_patterns);
        assert_eq!(config.idle_poll, Duration::from_secs(1));
        assert_eq!(config.busy_poll, Duration::from_millis(20));
        assert_eq!(config.visualization_mode, VisualizationMode::None);
    }

    #[test]
    fn test_progress_interval() {
        let args = vec![
            "tile-forge",
            "-s",
            "s.ron",
            "--report-progress-interval",
            "2s",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(
            config.report_progress_interval,
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_enum_flags() {
        let args = vec![
            "tile-forge",
            "-s",
            "s.ron",
            "--mode",
            "world",
            "--boundary-mode",
            "periodic",
            "--heuristic",
            "scanline",
            "--visualization-mode",
            "terminal",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.mode, RunMode::World);
        assert_eq!(config.overrides.boundary_mode, Some(BoundaryMode::Periodic));
        assert_eq!(config.overrides.heuristic, Some(Heuristic::Scanline));
        assert_eq!(config.visualization_mode, VisualizationMode::Terminal);

        let args_err = vec!["tile-forge", "-s", "s.ron", "--mode", "galaxy"];
        assert!(AppConfig::try_parse_from(args_err).is_err());
    }

    #[test]
    fn test_settings_defaults_match_core() {
        let config = AppConfig::try_parse_from(["tile-forge", "-s", "s.ron"]).unwrap();
        let settings = GenerationSettings::load(&config).unwrap();
        assert_eq!(settings, GenerationSettings::default());
        assert_eq!(settings.wfc_config(), WfcConfig::default());
    }

    #[test]
    fn test_flags_override_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forge.toml");
        fs::write(
            &path,
            "width = 12\nheight = 7\nboundary_mode = \"periodic\"\nseed = 99\n",
        )
        .unwrap();

        let config = AppConfig::try_parse_from([
            "tile-forge",
            "-s",
            "s.ron",
            "--config",
            path.to_str().unwrap(),
            "--height",
            "9",
        ])
        .unwrap();
        let settings = GenerationSettings::load(&config).unwrap();
        assert_eq!(settings.width, 12);
        assert_eq!(settings.height, 9);
        assert_eq!(settings.boundary_mode, BoundaryMode::Periodic);
        assert_eq!(settings.seed, Some(99));
        assert_eq!(settings.wfc_config().seed, Some(99));
    }

    #[test]
    fn test_empty_world_is_rejected() {
        let config =
            AppConfig::try_parse_from(["tile-forge", "-s", "s.ron", "--chunks-x", "0"]).unwrap();
        assert!(matches!(
            GenerationSettings::load(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_scheduler_config_uses_poll_flags() {
        let config = AppConfig::try_parse_from([
            "tile-forge",
            "-s",
            "s.ron",
            "--width",
            "9",
            "--height",
            "9",
            "--busy-poll",
            "5ms",
            "--show-patterns",
        ])
        .unwrap();
        let settings = GenerationSettings::load(&config).unwrap();
        let scheduler = settings.scheduler_config(&config, 7);
        assert_eq!(scheduler.spacing_x, 8);
        assert_eq!(scheduler.world_seed, 7);
        assert_eq!(scheduler.busy_poll, Duration::from_millis(5));
        assert!(scheduler.show_patterns);
    }
}
