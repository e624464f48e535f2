//! Simulation command handlers.

use super::{HeaderArgs, ManualArgs, OutputFormat};
use pacekeeper::simulate::{self, CallReport};
use pacekeeper::{
    CallQueue, HeaderLimitConfig, HeaderWaiter, ManualLimitConfig, ManualWaiter, PacerConfig,
    SystemClock, TracingObserver,
};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn Error>>;

/// Run sequential calls through a manual-limit waiter.
pub async fn run_manual(args: &ManualArgs) -> CliResult {
    let waiter = ManualWaiter::new(manual_config(args)?).with_observer(TracingObserver);
    info!(
        minutely_limit = %waiter.minutely_limit(),
        hourly_limit = %waiter.hourly_limit(),
        calls = args.calls,
        "Running simulated calls"
    );

    let reports = simulate::run_manual(&waiter, args.calls).await;
    print_reports(&reports, args.format)
}

/// Enqueue calls on a call queue and report their completion order.
pub async fn run_queued(args: &ManualArgs, call_ms: u64) -> CliResult {
    let waiter = ManualWaiter::new(manual_config(args)?).with_observer(TracingObserver);
    let queue = CallQueue::new(waiter);
    info!(calls = args.calls, call_ms, "Enqueueing simulated calls");

    let reports = simulate::run_queued(&queue, args.calls, Duration::from_millis(call_ms)).await?;
    print_reports(&reports, args.format)
}

/// Run calls paced by simulated rate limit headers.
pub async fn run_headers(args: &HeaderArgs) -> CliResult {
    let waiter = HeaderWaiter::new(header_config(args)?).with_observer(TracingObserver);
    info!(
        reset_unit = %waiter.config().reset_unit(),
        window = args.window,
        calls = args.calls,
        "Running simulated calls"
    );

    let reports = simulate::run_headers(
        &waiter,
        &SystemClock,
        args.calls,
        args.window,
        Duration::from_secs(args.reset_secs),
    )
    .await;

    if let Some(error) = simulate::first_rejection(&reports) {
        warn!(error, "Header check rejected a call");
    }
    print_reports(&reports, args.format)
}

fn load_config(path: Option<&Path>) -> Result<PacerConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => PacerConfig::from_file(path)?,
        None => PacerConfig::load()?,
    };
    Ok(config)
}

fn manual_config(args: &ManualArgs) -> Result<ManualLimitConfig, Box<dyn Error>> {
    let mut builder = load_config(args.config.as_deref())?.manual.to_builder();
    if let Some(limit) = args.minutely {
        builder = builder.minutely_limit(limit);
    }
    if let Some(limit) = args.hourly {
        builder = builder.hourly_limit(limit);
    }
    if let Some(delay) = args.delay_ms {
        builder = builder.delay_ms(delay);
    }
    if args.test_mode {
        builder = builder.test_mode(true);
    }
    Ok(builder.build())
}

fn header_config(args: &HeaderArgs) -> Result<HeaderLimitConfig, Box<dyn Error>> {
    let mut builder = load_config(args.config.as_deref())?.headers.to_builder();
    if let Some(unit) = args.reset_unit {
        builder = builder.reset_unit(unit);
    }
    if args.test_mode {
        builder = builder.test_mode(true);
    }
    Ok(builder.build())
}

fn print_reports(reports: &[CallReport], format: OutputFormat) -> CliResult {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?);
        }
        OutputFormat::Human => {
            for report in reports {
                println!("{}", describe(report));
            }
        }
    }
    Ok(())
}

fn describe(report: &CallReport) -> String {
    match report {
        CallReport::Manual { call, counts } => format!(
            "Call {:>3}: {} this minute, {} this hour, {} total",
            call, counts.calls_in_minute, counts.calls_in_hour, counts.total_calls
        ),
        CallReport::Queued { call, completed } => {
            format!("Call {:>3}: completed #{}", call, completed)
        }
        CallReport::Header {
            call,
            snapshot: Some(snapshot),
            ..
        } => format!(
            "Call {:>3}: limit {}, remaining {}, reset {}",
            call,
            display_field(snapshot.limit),
            display_field(snapshot.remaining),
            display_field(snapshot.reset)
        ),
        CallReport::Header { call, error, .. } => format!(
            "Call {:>3}: rejected ({})",
            call,
            error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn display_field(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
