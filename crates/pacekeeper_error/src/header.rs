//! Rate limit header error types.

use std::collections::BTreeMap;

/// Header-driven waiter error conditions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum HeaderErrorKind {
    /// At least one of the limit/remaining/reset headers was absent or did
    /// not hold a safe integer when the waiter was checked.
    #[display(
        "Corrupt or missing rate limit headers (expected '{}', '{}', '{}' with reset unit {})",
        limit_header,
        remaining_header,
        reset_header,
        reset_unit
    )]
    CorruptHeaders {
        /// Configured name of the limit header
        limit_header: String,
        /// Configured name of the remaining header
        remaining_header: String,
        /// Configured name of the reset header
        reset_header: String,
        /// Configured reset unit tag
        reset_unit: String,
        /// Raw headers from the last update, if any
        headers: Option<BTreeMap<String, String>>,
    },
}

/// Header error with location tracking.
///
/// # Examples
///
/// ```
/// use pacekeeper_error::{HeaderError, HeaderErrorKind};
///
/// let err = HeaderError::new(HeaderErrorKind::CorruptHeaders {
///     limit_header: "x-ratelimit-limit".to_string(),
///     remaining_header: "x-ratelimit-remaining".to_string(),
///     reset_header: "x-ratelimit-reset".to_string(),
///     reset_unit: "unix-s".to_string(),
///     headers: None,
/// });
/// assert!(format!("{}", err).contains("x-ratelimit-remaining"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Header Error: {} at line {} in {}", kind, line, file)]
pub struct HeaderError {
    kind: HeaderErrorKind,
    line: u32,
    file: &'static str,
}

impl HeaderError {
    /// Create a new header error with caller location tracking.
    #[track_caller]
    pub fn new(kind: HeaderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &HeaderErrorKind {
        &self.kind
    }

    /// Raw headers captured when the error was raised.
    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            HeaderErrorKind::CorruptHeaders { headers, .. } => headers.as_ref(),
        }
    }
}
