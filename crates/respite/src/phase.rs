// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::time::Duration;

use crate::ConfigError;
use crate::unit::{TimeUnit, millis_to_duration_saturating};

/// The growth shape of a [`RetryPhase`] together with the parameters that shape needs.
///
/// Each variant carries exactly the parameters it requires, so a phase can never be missing one
/// or carry one that belongs to another shape. All amounts are expressed in the phase's
/// [`TimeUnit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    /// `initial_delay * factor^i` for the phase-local retry index `i` (0-based).
    ///
    /// **Example with `initial_delay = 2`, `factor = 2`:** `2, 4, 8, 16, ...`
    Exponential {
        /// Delay of the first retry in this phase.
        initial_delay: f64,
        /// Multiplier applied for each following retry.
        factor: f64,
    },

    /// `initial_delay * (i + 1)` for the phase-local retry index `i` (0-based).
    ///
    /// **Example with `initial_delay = 2`:** `2, 4, 6, 8, ...`
    Linear {
        /// Delay of the first retry in this phase and the step between retries.
        initial_delay: f64,
    },

    /// The same delay for every retry in this phase.
    Constant {
        /// Delay between retries.
        retry_interval: f64,
    },
}

impl Growth {
    /// Returns the configuration tag of this growth shape (`EXPONENTIAL`, `LINEAR` or `CONSTANT`).
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Exponential { .. } => "EXPONENTIAL",
            Self::Linear { .. } => "LINEAR",
            Self::Constant { .. } => "CONSTANT",
        }
    }
}

impl Display for Growth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// How many retries a [`RetryPhase`] contributes to the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Retries {
    /// A fixed number of retries.
    Finite(u32),

    /// As many retries as the global cap leaves room for.
    #[default]
    Unbounded,
}

impl Retries {
    /// Returns how many retries this phase contributes when `remaining` slots are left under the cap.
    #[must_use]
    pub fn budget(self, remaining: u32) -> u32 {
        match self {
            Self::Finite(count) => count.min(remaining),
            Self::Unbounded => remaining,
        }
    }
}

impl From<u32> for Retries {
    fn from(value: u32) -> Self {
        Self::Finite(value)
    }
}

/// One configured stage of a retry policy.
///
/// A policy is an ordered list of phases, e.g. "4 exponential retries, then 1 wait of 30s, then
/// indefinite 60s retries". Phases are plain immutable values; they are flattened into a
/// [`RetrySchedule`][crate::RetrySchedule] once, at setup time.
///
/// New phases default to [`Retries::Unbounded`] and [`TimeUnit::Seconds`].
///
/// # Examples
///
/// ```
/// use respite::{RetryPhase, TimeUnit};
///
/// let phases = [
///     RetryPhase::exponential(2.0, 2.0).retries(4),
///     RetryPhase::constant(30.0).retries(1),
///     RetryPhase::constant(1.0).unit(TimeUnit::Minutes).unbounded(),
/// ];
/// assert_eq!(phases[0].growth().tag(), "EXPONENTIAL");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPhase {
    growth: Growth,
    retries: Retries,
    unit: TimeUnit,
}

impl RetryPhase {
    /// Creates a phase from its parts.
    #[must_use]
    pub fn new(growth: Growth, retries: impl Into<Retries>, unit: TimeUnit) -> Self {
        Self {
            growth,
            retries: retries.into(),
            unit,
        }
    }

    /// Creates an exponential phase starting at `initial_delay` and growing by `factor`.
    #[must_use]
    pub fn exponential(initial_delay: f64, factor: f64) -> Self {
        Self::new(Growth::Exponential { initial_delay, factor }, Retries::Unbounded, TimeUnit::Seconds)
    }

    /// Creates a linear phase whose delays grow by `initial_delay` per retry.
    #[must_use]
    pub fn linear(initial_delay: f64) -> Self {
        Self::new(Growth::Linear { initial_delay }, Retries::Unbounded, TimeUnit::Seconds)
    }

    /// Creates a constant phase that waits `retry_interval` before every retry.
    #[must_use]
    pub fn constant(retry_interval: f64) -> Self {
        Self::new(Growth::Constant { retry_interval }, Retries::Unbounded, TimeUnit::Seconds)
    }

    /// Limits the phase to `retries` retries.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Retries::Finite(retries);
        self
    }

    /// Lets the phase run until the global retry cap is reached.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.retries = Retries::Unbounded;
        self
    }

    /// Sets the unit in which the phase parameters are expressed.
    #[must_use]
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Returns the growth shape and its parameters.
    #[must_use]
    pub fn growth(&self) -> Growth {
        self.growth
    }

    /// Returns the retry budget of this phase.
    #[must_use]
    pub fn retries_budget(&self) -> Retries {
        self.retries
    }

    /// Returns the unit of the phase parameters.
    #[must_use]
    pub fn time_unit(&self) -> TimeUnit {
        self.unit
    }

    /// Checks that every numeric parameter is finite and non-negative.
    ///
    /// `index` is the position of the phase in its policy and is only used for error reporting.
    pub(crate) fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let check = |parameter: &'static str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidParameter {
                    phase: index,
                    parameter,
                    value,
                })
            }
        };

        match self.growth {
            Growth::Exponential { initial_delay, factor } => {
                check("initialDelay", initial_delay)?;
                check("factor", factor)
            }
            Growth::Linear { initial_delay } => check("initialDelay", initial_delay),
            Growth::Constant { retry_interval } => check("retryInterval", retry_interval),
        }
    }

    /// Generates the first `count` delays of this phase.
    pub(crate) fn delays(&self, count: u32) -> impl Iterator<Item = Duration> + use<> {
        #[expect(clippy::cast_precision_loss, reason = "unit multipliers are small and exactly representable")]
        let unit_millis = self.unit.millis() as f64;
        let growth = self.growth;

        (0..count).map(move |index| {
            let millis = match growth {
                Growth::Exponential { initial_delay, factor } => {
                    initial_delay * factor.powi(i32::try_from(index).unwrap_or(i32::MAX)) * unit_millis
                }
                Growth::Linear { initial_delay } => initial_delay * f64::from(index.saturating_add(1)) * unit_millis,
                Growth::Constant { retry_interval } => retry_interval * unit_millis,
            };

            millis_to_duration_saturating(millis)
        })
    }
}
