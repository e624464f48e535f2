//! Normalized quota values.

use serde::Serialize;
use std::time::Duration;

/// A call quota for one window, after normalization.
///
/// Raw configuration values that are missing, zero or negative become
/// [`QuotaLimit::Unbounded`]; configuration never fails because of them.
///
/// # Example
///
/// ```
/// use pacekeeper_rate_limit::QuotaLimit;
///
/// assert_eq!(QuotaLimit::from_raw(Some(5)), QuotaLimit::PerWindow(5));
/// assert_eq!(QuotaLimit::from_raw(Some(-1)), QuotaLimit::Unbounded);
/// assert!(QuotaLimit::PerWindow(5).is_reached(5));
/// assert!(!QuotaLimit::Unbounded.is_reached(u64::MAX));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, derive_more::Display)]
pub enum QuotaLimit {
    /// No cap for this window.
    #[default]
    #[display("unbounded")]
    Unbounded,
    /// At most this many calls per window.
    #[display("{}", _0)]
    PerWindow(u64),
}

impl QuotaLimit {
    /// Normalize a raw configured limit.
    pub fn from_raw(raw: Option<i64>) -> Self {
        match raw {
            Some(limit) if limit > 0 => QuotaLimit::PerWindow(limit as u64),
            _ => QuotaLimit::Unbounded,
        }
    }

    /// Whether `count` calls already exhaust this window.
    pub fn is_reached(&self, count: u64) -> bool {
        match self {
            QuotaLimit::Unbounded => false,
            QuotaLimit::PerWindow(limit) => count >= *limit,
        }
    }

    /// The cap, if any.
    pub fn get(&self) -> Option<u64> {
        match self {
            QuotaLimit::Unbounded => None,
            QuotaLimit::PerWindow(limit) => Some(*limit),
        }
    }
}

/// Normalize a raw inter-call delay in milliseconds.
///
/// Missing, zero and negative delays disable the delay.
pub fn delay_from_raw(raw: Option<i64>) -> Duration {
    match raw {
        Some(millis) if millis > 0 => Duration::from_millis(millis as u64),
        _ => Duration::ZERO,
    }
}
