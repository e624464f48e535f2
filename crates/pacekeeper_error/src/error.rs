//! Top-level error wrapper types.

use crate::{ConfigError, HeaderError, QueueError};

/// Every error the Pacekeeper crates can produce.
///
/// # Examples
///
/// ```
/// use pacekeeper_error::{PacekeeperError, QueueError, QueueErrorKind};
///
/// let queue_err = QueueError::new(QueueErrorKind::Dropped);
/// let err: PacekeeperError = queue_err.into();
/// assert!(format!("{}", err).contains("Queue Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PacekeeperErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Rate limit headers were corrupt or missing
    #[from(HeaderError)]
    Header(HeaderError),
    /// A queued call never delivered its result
    #[from(QueueError)]
    Queue(QueueError),
}

/// Pacekeeper error with kind discrimination.
///
/// # Examples
///
/// ```
/// use pacekeeper_error::{ConfigError, PacekeeperResult};
///
/// fn might_fail() -> PacekeeperResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Pacekeeper Error: {}", _0)]
pub struct PacekeeperError(Box<PacekeeperErrorKind>);

impl PacekeeperError {
    /// Create a new error from a kind.
    pub fn new(kind: PacekeeperErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PacekeeperErrorKind {
        &self.0
    }
}

impl<T> From<T> for PacekeeperError
where
    T: Into<PacekeeperErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Pacekeeper operations.
pub type PacekeeperResult<T> = std::result::Result<T, PacekeeperError>;
