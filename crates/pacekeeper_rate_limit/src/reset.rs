//! Interpretation of the reset header value.

use serde::{Deserialize, Serialize};

/// How the value of the reset header should be read.
///
/// Providers disagree: some send the absolute instant the window reopens
/// (as Unix seconds or milliseconds), others send how long until it does.
/// Check a real response before picking one.
///
/// The string tags are accepted by [`std::str::FromStr`], serde and the CLI.
///
/// # Example
///
/// ```
/// use pacekeeper_rate_limit::ResetUnit;
///
/// let unit: ResetUnit = "minutes".parse().unwrap();
/// assert_eq!(unit.multiplier(), Some(60.0));
/// assert_eq!(ResetUnit::default().to_string(), "unix-s");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum ResetUnit {
    /// Absolute Unix time in milliseconds.
    #[serde(rename = "unix-ms")]
    #[strum(serialize = "unix-ms")]
    EpochMillis,
    /// Absolute Unix time in seconds.
    #[default]
    #[serde(rename = "unix-s")]
    #[strum(serialize = "unix-s")]
    EpochSeconds,
    /// Relative count of milliseconds from now.
    #[serde(rename = "milliseconds")]
    #[strum(serialize = "milliseconds")]
    Milliseconds,
    /// Relative count of seconds from now.
    #[serde(rename = "seconds")]
    #[strum(serialize = "seconds")]
    Seconds,
    /// Relative count of minutes from now.
    #[serde(rename = "minutes")]
    #[strum(serialize = "minutes")]
    Minutes,
    /// Relative count of hours from now.
    #[serde(rename = "hours")]
    #[strum(serialize = "hours")]
    Hours,
}

impl ResetUnit {
    /// Seconds per unit for relative counts, `None` for absolute epochs.
    pub fn multiplier(&self) -> Option<f64> {
        match self {
            ResetUnit::EpochMillis | ResetUnit::EpochSeconds => None,
            ResetUnit::Milliseconds => Some(0.001),
            ResetUnit::Seconds => Some(1.0),
            ResetUnit::Minutes => Some(60.0),
            ResetUnit::Hours => Some(3600.0),
        }
    }

    /// Whether the reset value names an absolute instant.
    pub fn is_absolute(&self) -> bool {
        self.multiplier().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tags_round_trip_through_from_str() {
        for unit in ResetUnit::iter() {
            let parsed: ResetUnit = unit.to_string().parse().unwrap();
            assert_eq!(parsed, unit);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!("fortnights".parse::<ResetUnit>().is_err());
    }

    #[test]
    fn only_relative_units_have_multipliers() {
        assert!(ResetUnit::EpochMillis.is_absolute());
        assert!(ResetUnit::EpochSeconds.is_absolute());
        assert_eq!(ResetUnit::Milliseconds.multiplier(), Some(0.001));
        assert_eq!(ResetUnit::Hours.multiplier(), Some(3600.0));
    }
}
