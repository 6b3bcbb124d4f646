//! Command-line interface for music-linker.
//!
//! This module provides CLI commands for linking a single track, linking a
//! directory of JAMS annotations, and inspecting the configuration.

mod commands;

pub use commands::{Cli, Commands, run_command};
