//! Setup module for the Tile Forge application.
//!
//! This module contains the execution of the level and world modes.

pub mod execution;
