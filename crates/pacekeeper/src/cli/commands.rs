//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use pacekeeper::ResetUnit;
use std::path::PathBuf;

/// Pacekeeper - watch client-side call pacing against simulated APIs
#[derive(Parser, Debug)]
#[command(name = "pacekeeper")]
#[command(about = "Simulate paced API calls against minute/hour quotas and rate limit headers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run simulated calls one after another through a manual-limit waiter
    Manual(ManualArgs),

    /// Enqueue simulated calls on a FIFO call queue
    Queued {
        #[command(flatten)]
        limits: ManualArgs,

        /// How long each simulated call takes, in milliseconds
        #[arg(long, default_value = "100")]
        call_ms: u64,
    },

    /// Run simulated calls paced by rate limit response headers
    Headers(HeaderArgs),
}

/// Options shared by the manual-limit commands
#[derive(Args, Debug, Clone)]
pub struct ManualArgs {
    /// Calls allowed per clock minute (overrides the configuration file)
    #[arg(long)]
    pub minutely: Option<i64>,

    /// Calls allowed per clock hour (overrides the configuration file)
    #[arg(long)]
    pub hourly: Option<i64>,

    /// Fixed pause before every call, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<i64>,

    /// Number of simulated calls
    #[arg(long, default_value = "10")]
    pub calls: usize,

    /// Cap every wait at a couple of seconds
    #[arg(long)]
    pub test_mode: bool,

    /// Configuration file to start from
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

/// Options for the header-driven command
#[derive(Args, Debug, Clone)]
pub struct HeaderArgs {
    /// Number of simulated calls
    #[arg(long, default_value = "10")]
    pub calls: usize,

    /// Calls the simulated API allows per window
    #[arg(long, default_value = "3")]
    pub window: i64,

    /// Seconds until the simulated window resets
    #[arg(long, default_value = "3")]
    pub reset_secs: u64,

    /// How the reset header is read (unix-ms, unix-s, milliseconds, seconds, minutes, hours)
    #[arg(long)]
    pub reset_unit: Option<ResetUnit>,

    /// Cap every wait at a couple of seconds
    #[arg(long)]
    pub test_mode: bool,

    /// Configuration file to start from
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

/// Output format for call reports
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
