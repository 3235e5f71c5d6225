//! # Tile Forge Application (Binary)
//!
//! Main executable entry point.

// Every dependency is used through the library target.
#![allow(unused_crate_dependencies)]

fn main() -> anyhow::Result<()> {
    tile_forge_app::run()
}
