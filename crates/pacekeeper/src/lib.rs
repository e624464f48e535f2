//! Pacekeeper - client-side pacing for outbound API calls
//!
//! Pacekeeper keeps a caller inside an API's rate limits by suspending calls
//! until the limits allow them. It never makes the calls itself: the caller
//! asks for permission, makes the call, and (for header-driven pacing) hands
//! the response headers back.
//!
//! # Features
//!
//! - **Manual limits**: calls per clock minute and per clock hour, plus an
//!   optional fixed delay between calls
//! - **Header-driven limits**: `x-ratelimit-*` style headers with absolute or
//!   relative reset values
//! - **FIFO queue**: calls run strictly one at a time in enqueue order
//! - **Wait reporting**: start, per-second tick and end events through a
//!   `WaitObserver`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pacekeeper::{ManualLimitConfig, ManualWaiter, TracingObserver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let waiter = ManualWaiter::new(
//!         ManualLimitConfig::builder()
//!             .minutely_limit(5)
//!             .hourly_limit(10)
//!             .build(),
//!     )
//!     .with_observer(TracingObserver);
//!
//!     for _ in 0..6 {
//!         let counts = waiter.check().await;
//!         println!("Calls this minute: {}", counts.calls_in_minute);
//!     }
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `reqwest` - feed `reqwest::header::HeaderMap` responses straight into a
//!   `HeaderWaiter`
//!
//! # Architecture
//!
//! - `pacekeeper_error` - Error types
//! - `pacekeeper_rate_limit` - Waiters, call queue, observers and configuration
//!
//! This crate (`pacekeeper`) re-exports both and hosts the `pacekeeper`
//! command-line simulator.

pub use pacekeeper_error::*;
pub use pacekeeper_rate_limit::*;

pub mod logging;
pub mod simulate;
