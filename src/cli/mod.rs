//! CLI module for aftctl.
//!
//! This module provides the command-line interface for setting up the
//! AFT prerequisites.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
