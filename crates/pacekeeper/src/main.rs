//! Pacekeeper CLI binary.
//!
//! This binary simulates paced call sequences so the waiters can be watched
//! from a terminal:
//! - Sequential calls through a manual-limit waiter
//! - Calls enqueued on a FIFO call queue
//! - Calls paced by simulated rate limit headers

use clap::Parser;
use pacekeeper::logging::{LoggingConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_headers, run_manual, run_queued};

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    init_logging(LoggingConfig::new(log_level).with_json_logs(cli.json))?;

    // Execute the requested command
    match cli.command {
        Commands::Manual(args) => {
            run_manual(&args).await?;
        }

        Commands::Queued { limits, call_ms } => {
            run_queued(&limits, call_ms).await?;
        }

        Commands::Headers(args) => {
            run_headers(&args).await?;
        }
    }

    Ok(())
}
