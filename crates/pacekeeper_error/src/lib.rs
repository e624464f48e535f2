//! Error types for the Pacekeeper library.
//!
//! This crate provides the error types shared by the Pacekeeper crates.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Misconfigured limits and delays are never errors; the waiters normalize
//! them to permissive defaults. The only runtime failures are corrupt
//! rate limit headers and queued calls that never delivered a result.
//!
//! # Examples
//!
//! ```
//! use pacekeeper_error::{ConfigError, PacekeeperResult};
//!
//! fn load() -> PacekeeperResult<String> {
//!     Err(ConfigError::new("pacekeeper.toml: missing [manual] section"))?
//! }
//!
//! match load() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod header;
mod queue;

pub use config::ConfigError;
pub use error::{PacekeeperError, PacekeeperErrorKind, PacekeeperResult};
pub use header::{HeaderError, HeaderErrorKind};
pub use queue::{QueueError, QueueErrorKind};
