//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the pacekeeper binary.

mod commands;
mod run;

pub use commands::{Cli, Commands, HeaderArgs, ManualArgs, OutputFormat};
pub use run::{run_headers, run_manual, run_queued};
