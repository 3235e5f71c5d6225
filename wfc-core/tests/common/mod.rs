// Shared fixtures for wfc-core integration tests
#![allow(dead_code)]

use std::sync::Arc;
use wfc_core::{BoundaryMode, GridSink, MemoryGrid, OverlappingModel, WfcConfig};
use wfc_rules::{SampleGrid, SymmetryTable};

pub const CHECKERBOARD: [&str; 3] = ["#.#", ".#.", "#.#"];
pub const STRIPES: [&str; 4] = ["#.#.", "#.#.", "#.#.", "#.#."];
pub const BLOBS: [&str; 5] = ["...##", "...##", ".....", "##...", "##..."];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn build_model(
    rows: &[&str],
    config: &WfcConfig,
    sink: &Arc<MemoryGrid>,
) -> OverlappingModel {
    let sample = SampleGrid::from_rows(rows).expect("valid sample");
    let sink: Arc<dyn GridSink> = Arc::clone(sink) as Arc<dyn GridSink>;
    OverlappingModel::new(&[&sample], &SymmetryTable::identity(), sink, config)
        .expect("model should build")
}

/// 4x4 periodic output over the checkerboard sample.
pub fn checkerboard_config() -> WfcConfig {
    WfcConfig::builder()
        .size(4, 4)
        .pattern_size(2)
        .periodic_input(true)
        .symmetry(1)
        .boundary_mode(BoundaryMode::Periodic)
        .build()
}

/// 9x9 clamped chunks, spaced 8 apart.
pub fn chunk_config() -> WfcConfig {
    WfcConfig::builder()
        .size(9, 9)
        .pattern_size(2)
        .periodic_input(true)
        .symmetry(1)
        .boundary_mode(BoundaryMode::Clamped)
        .seed(2024)
        .build()
}
