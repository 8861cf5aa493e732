// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Declarative retry configuration.
//!
//! These types mirror the JSON shape retry policies are usually written in:
//!
//! ```json
//! {
//!   "totalRetries": 20,
//!   "includeTimeouts": true,
//!   "includeJitter": true,
//!   "phases": [
//!     { "growth": "EXPONENTIAL", "factor": 2, "initialDelay": 2, "totalRetries": 4, "unit": "seconds" },
//!     { "growth": "CONSTANT", "retryInterval": 30, "totalRetries": 1, "unit": "seconds" },
//!     { "growth": "CONSTANT", "retryInterval": 60, "totalRetries": "infinity", "unit": "seconds" }
//!   ]
//! }
//! ```
//!
//! Deserialization requires the `serde` feature. Conversion into a [`RetrySchedule`] fails fast
//! with a [`ConfigError`] on the first invalid phase.

use std::time::Duration;

use crate::{ConfigError, DecideOptions, Growth, Jitter, Retries, RetryPhase, RetrySchedule, TimeUnit};

const EXPONENTIAL: &str = "EXPONENTIAL";
const LINEAR: &str = "LINEAR";
const CONSTANT: &str = "CONSTANT";

const INITIAL_DELAY: &str = "initialDelay";
const FACTOR: &str = "factor";
const RETRY_INTERVAL: &str = "retryInterval";

/// The retry budget of a [`PhaseConfig`], as written in the configuration.
///
/// Accepts a whole number, or one of the strings `"infinity"` and `"unbounded"` (in any case)
/// for a phase that runs until the global cap is reached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(untagged))]
pub enum RetriesConfig {
    /// A retry count. Positive infinity means unbounded.
    Count(f64),

    /// A keyword such as `"infinity"`.
    Keyword(String),
}

impl RetriesConfig {
    fn to_retries(&self, phase: usize) -> Result<Retries, ConfigError> {
        match self {
            Self::Count(count) if *count == f64::INFINITY => Ok(Retries::Unbounded),
            Self::Count(count) if count.is_finite() && *count >= 0.0 && count.fract() == 0.0 && *count <= f64::from(u32::MAX) => {
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "range and integrality checked above"
                )]
                let count = *count as u32;
                Ok(Retries::Finite(count))
            }
            Self::Count(count) => Err(ConfigError::InvalidRetries {
                phase,
                value: count.to_string().into(),
            }),
            Self::Keyword(keyword) if keyword.eq_ignore_ascii_case("infinity") || keyword.eq_ignore_ascii_case("unbounded") => {
                Ok(Retries::Unbounded)
            }
            Self::Keyword(keyword) => Err(ConfigError::InvalidRetries {
                phase,
                value: keyword.clone().into(),
            }),
        }
    }
}

impl From<u32> for RetriesConfig {
    fn from(value: u32) -> Self {
        Self::Count(f64::from(value))
    }
}

/// One phase of a declarative retry policy.
///
/// The `growth` tag selects which of the numeric parameters are used. Exactly the parameters of
/// the selected growth must be present:
///
/// | `growth`      | parameters                |
/// |---------------|---------------------------|
/// | `EXPONENTIAL` | `initialDelay`, `factor`  |
/// | `LINEAR`      | `initialDelay`            |
/// | `CONSTANT`    | `retryInterval`           |
///
/// A missing `totalRetries` makes the phase unbounded. A missing `unit` means seconds.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(rename_all = "camelCase"))]
pub struct PhaseConfig {
    /// `EXPONENTIAL`, `LINEAR` or `CONSTANT` (case-insensitive).
    pub growth: String,

    /// Retries contributed by this phase.
    #[cfg_attr(any(feature = "serde", test), serde(default, skip_serializing_if = "Option::is_none"))]
    pub total_retries: Option<RetriesConfig>,

    /// Unit of the numeric parameters.
    #[cfg_attr(any(feature = "serde", test), serde(default))]
    pub unit: TimeUnit,

    /// Growth factor of an exponential phase.
    #[cfg_attr(any(feature = "serde", test), serde(default, skip_serializing_if = "Option::is_none"))]
    pub factor: Option<f64>,

    /// First delay of an exponential or linear phase.
    #[cfg_attr(any(feature = "serde", test), serde(default, skip_serializing_if = "Option::is_none"))]
    pub initial_delay: Option<f64>,

    /// Delay of a constant phase.
    #[cfg_attr(any(feature = "serde", test), serde(default, skip_serializing_if = "Option::is_none"))]
    pub retry_interval: Option<f64>,
}

impl PhaseConfig {
    /// Converts the configuration into a [`RetryPhase`].
    ///
    /// `index` is the position of the phase in its policy and is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the growth tag is unknown, a required parameter is missing,
    /// a parameter of another growth is present, a parameter is negative or non-finite, or the
    /// retry count is not a whole non-negative number.
    pub fn to_phase(&self, index: usize) -> Result<RetryPhase, ConfigError> {
        let tag = self.growth.trim();

        let growth = if tag.eq_ignore_ascii_case(EXPONENTIAL) {
            reject(index, EXPONENTIAL, RETRY_INTERVAL, self.retry_interval)?;
            Growth::Exponential {
                initial_delay: require(index, EXPONENTIAL, INITIAL_DELAY, self.initial_delay)?,
                factor: require(index, EXPONENTIAL, FACTOR, self.factor)?,
            }
        } else if tag.eq_ignore_ascii_case(LINEAR) {
            reject(index, LINEAR, FACTOR, self.factor)?;
            reject(index, LINEAR, RETRY_INTERVAL, self.retry_interval)?;
            Growth::Linear {
                initial_delay: require(index, LINEAR, INITIAL_DELAY, self.initial_delay)?,
            }
        } else if tag.eq_ignore_ascii_case(CONSTANT) {
            reject(index, CONSTANT, FACTOR, self.factor)?;
            reject(index, CONSTANT, INITIAL_DELAY, self.initial_delay)?;
            Growth::Constant {
                retry_interval: require(index, CONSTANT, RETRY_INTERVAL, self.retry_interval)?,
            }
        } else {
            return Err(ConfigError::UnknownGrowth {
                phase: index,
                growth: self.growth.clone(),
            });
        };

        let retries = match &self.total_retries {
            Some(retries) => retries.to_retries(index)?,
            None => Retries::Unbounded,
        };

        let phase = RetryPhase::new(growth, retries, self.unit);
        phase.validate(index)?;
        Ok(phase)
    }
}

impl TryFrom<&PhaseConfig> for RetryPhase {
    type Error = ConfigError;

    fn try_from(config: &PhaseConfig) -> Result<Self, Self::Error> {
        config.to_phase(0)
    }
}

fn require(phase: usize, growth: &'static str, parameter: &'static str, value: Option<f64>) -> Result<f64, ConfigError> {
    value.ok_or(ConfigError::MissingParameter { phase, growth, parameter })
}

fn reject(phase: usize, growth: &'static str, parameter: &'static str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(_) => Err(ConfigError::UnexpectedParameter { phase, growth, parameter }),
        None => Ok(()),
    }
}

/// A complete declarative retry policy: phases, global cap and decision options.
///
/// # Examples
///
/// ```
/// use respite::config::{PhaseConfig, RetryConfig};
///
/// let config = RetryConfig {
///     phases: vec![PhaseConfig {
///         growth: "LINEAR".to_string(),
///         initial_delay: Some(1.0),
///         ..PhaseConfig::default()
///     }],
///     total_retries: 3,
///     ..RetryConfig::default()
/// };
///
/// assert_eq!(config.schedule()?.len(), 3);
/// # Ok::<(), respite::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(rename_all = "camelCase"))]
pub struct RetryConfig {
    /// Phases, in the order they are consumed.
    pub phases: Vec<PhaseConfig>,

    /// Global cap on the number of retries.
    pub total_retries: u32,

    /// Discount the time spent by failed attempts from the planned wait.
    #[cfg_attr(any(feature = "serde", test), serde(default, alias = "includeTimeOuts"))]
    pub include_timeouts: bool,

    /// Add jitter to planned delays.
    #[cfg_attr(any(feature = "serde", test), serde(default))]
    pub include_jitter: bool,

    /// Jitter spread per attempt, in milliseconds. Defaults to 100.
    #[cfg_attr(any(feature = "serde", test), serde(default, skip_serializing_if = "Option::is_none"))]
    pub jitter_unit_ms: Option<u64>,

    /// Largest jitter spread, in milliseconds. Defaults to 1000.
    #[cfg_attr(any(feature = "serde", test), serde(default, skip_serializing_if = "Option::is_none"))]
    pub jitter_cap_ms: Option<u64>,
}

impl RetryConfig {
    /// Converts every phase, in order.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of the first invalid phase.
    pub fn phases(&self) -> Result<Vec<RetryPhase>, ConfigError> {
        self.phases.iter().enumerate().map(|(index, phase)| phase.to_phase(index)).collect()
    }

    /// Builds the schedule described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of the first invalid phase; no partial schedule is produced.
    pub fn schedule(&self) -> Result<RetrySchedule, ConfigError> {
        RetrySchedule::build(&self.phases()?, self.total_retries)
    }

    /// Returns the decision options described by this configuration.
    #[must_use]
    pub fn decide_options(&self) -> DecideOptions {
        let mut jitter = Jitter::disabled().enable(self.include_jitter);

        if let Some(unit) = self.jitter_unit_ms {
            jitter = jitter.unit(Duration::from_millis(unit));
        }

        if let Some(cap) = self.jitter_cap_ms {
            jitter = jitter.cap(Duration::from_millis(cap));
        }

        DecideOptions::new().compensate_elapsed_time(self.include_timeouts).jitter(jitter)
    }
}
