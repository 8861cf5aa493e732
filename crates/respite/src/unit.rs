// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::time::Duration;

const MILLIS_PER_SECOND: u64 = 1000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;

/// The time unit in which the numeric parameters of a [`RetryPhase`][crate::RetryPhase] are expressed.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use respite::TimeUnit;
///
/// assert_eq!(TimeUnit::Minutes.millis(), 60_000);
/// assert_eq!(TimeUnit::Seconds.to_duration(1.5), Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(rename_all = "lowercase"))]
pub enum TimeUnit {
    /// Parameters are whole or fractional seconds.
    #[default]
    Seconds,

    /// Parameters are minutes.
    Minutes,

    /// Parameters are hours.
    Hours,
}

impl TimeUnit {
    /// Returns the number of milliseconds in one unit.
    #[must_use]
    pub const fn millis(self) -> u64 {
        match self {
            Self::Seconds => MILLIS_PER_SECOND,
            Self::Minutes => MILLIS_PER_MINUTE,
            Self::Hours => MILLIS_PER_HOUR,
        }
    }

    /// Converts `amount` units into a [`Duration`].
    ///
    /// The conversion saturates at [`Duration::MAX`]. Amounts that are zero, negative or not a
    /// number convert to [`Duration::ZERO`]; phases reject such amounts before they get here.
    #[must_use]
    pub fn to_duration(self, amount: f64) -> Duration {
        #[expect(clippy::cast_precision_loss, reason = "unit multipliers are small and exactly representable")]
        let millis = amount * self.millis() as f64;
        millis_to_duration_saturating(millis)
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seconds => f.write_str("seconds"),
            Self::Minutes => f.write_str("minutes"),
            Self::Hours => f.write_str("hours"),
        }
    }
}

pub(crate) fn millis_to_duration_saturating(millis: f64) -> Duration {
    if millis.is_nan() || millis <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX)
}
