//! Call queue error types.

/// Ways a queued call can fail to deliver its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum QueueErrorKind {
    /// The call was dropped before it produced a value (it panicked, or the
    /// runtime shut down while it was pending).
    #[display("Queued call was dropped before completing")]
    Dropped,
}

/// Call queue error with location tracking.
///
/// # Examples
///
/// ```
/// use pacekeeper_error::{QueueError, QueueErrorKind};
///
/// let err = QueueError::new(QueueErrorKind::Dropped);
/// assert_eq!(err.kind(), &QueueErrorKind::Dropped);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Queue Error: {} at line {} in {}", kind, line, file)]
pub struct QueueError {
    kind: QueueErrorKind,
    line: u32,
    file: &'static str,
}

impl QueueError {
    /// Create a new queue error with caller location tracking.
    #[track_caller]
    pub fn new(kind: QueueErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &QueueErrorKind {
        &self.kind
    }
}
