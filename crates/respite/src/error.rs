// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::Display;

/// An error raised while turning retry configuration into a [`RetrySchedule`][crate::RetrySchedule].
///
/// Configuration errors are only produced at setup time. Deciding the delay of an individual
/// attempt never fails with a `ConfigError`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The growth tag of a phase is not one of `EXPONENTIAL`, `LINEAR` or `CONSTANT`.
    #[error("phase {phase}: unknown growth '{growth}'")]
    UnknownGrowth {
        /// Position of the offending phase.
        phase: usize,
        /// The unrecognized tag.
        growth: String,
    },

    /// A parameter required by the growth shape of a phase is absent.
    #[error("phase {phase}: {growth} growth requires '{parameter}'")]
    MissingParameter {
        /// Position of the offending phase.
        phase: usize,
        /// Growth shape of the phase.
        growth: &'static str,
        /// Name of the missing parameter.
        parameter: &'static str,
    },

    /// A parameter that does not belong to the growth shape of a phase is present.
    #[error("phase {phase}: '{parameter}' is not a parameter of {growth} growth")]
    UnexpectedParameter {
        /// Position of the offending phase.
        phase: usize,
        /// Growth shape of the phase.
        growth: &'static str,
        /// Name of the extra parameter.
        parameter: &'static str,
    },

    /// A numeric parameter is negative, infinite or not a number.
    #[error("phase {phase}: '{parameter}' must be a finite, non-negative number, got {value}")]
    InvalidParameter {
        /// Position of the offending phase.
        phase: usize,
        /// Name of the parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A retry count could not be interpreted.
    #[error("phase {phase}: invalid retry count '{value}'")]
    InvalidRetries {
        /// Position of the offending phase.
        phase: usize,
        /// The rejected value, as written in the configuration.
        value: Cow<'static, str>,
    },

    /// The phases and cap describe more retries than a schedule may hold.
    #[error("schedule of {retries} retries exceeds the limit of {limit}")]
    TooManyRetries {
        /// Number of retries the phases and cap describe.
        retries: u32,
        /// The largest permitted number of retries.
        limit: u32,
    },
}

/// The terminal signal returned once every scheduled retry has been used.
///
/// Carries the failure of the last attempt so that callers can surface it unchanged.
///
/// # Examples
///
/// ```
/// use respite::{DecideOptions, DelayDecider, RetryPhase, RetrySchedule};
/// use tick::Clock;
///
/// let schedule = RetrySchedule::build(&[RetryPhase::constant(1.0)], 1)?;
/// let decider = DelayDecider::new(schedule, DecideOptions::default(), &Clock::new_frozen());
///
/// let exhausted = decider.next_delay(2, None).into_result("connection reset").unwrap_err();
/// assert_eq!(exhausted.retries(), 1);
/// assert_eq!(exhausted.into_failure(), "connection reset");
/// # Ok::<(), respite::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriesExhausted<F> {
    retries: u32,
    failure: F,
}

impl<F> RetriesExhausted<F> {
    pub(crate) fn new(retries: u32, failure: F) -> Self {
        Self { retries, failure }
    }

    /// Returns the number of retries the schedule allowed.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Returns the failure of the last attempt.
    #[must_use]
    pub fn failure(&self) -> &F {
        &self.failure
    }

    /// Consumes the signal and returns the failure of the last attempt.
    #[must_use]
    pub fn into_failure(self) -> F {
        self.failure
    }
}

impl<F> Display for RetriesExhausted<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "retries exhausted after {} retries", self.retries)
    }
}

impl<F> std::error::Error for RetriesExhausted<F>
where
    F: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.failure)
    }
}
