// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use crate::{ConfigError, RetryPhase};

/// The flattened, capped plan of retry delays derived from an ordered list of [`RetryPhase`]s.
///
/// A schedule holds one delay per permitted retry together with its running sum, so that
/// `cumulative_delays()[i]` is the total time planned to be spent waiting up to and including
/// retry `i + 1`. The schedule is immutable; clones share the same storage and can be read
/// concurrently by any number of in-flight requests.
///
/// Building is deterministic: the same phases and cap always produce equal schedules.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use respite::{RetryPhase, RetrySchedule};
///
/// let schedule = RetrySchedule::build(
///     &[
///         RetryPhase::exponential(2.0, 2.0).retries(4),
///         RetryPhase::constant(30.0).retries(1),
///     ],
///     5,
/// )?;
///
/// assert_eq!(schedule.len(), 5);
/// assert_eq!(schedule.delay(5), Some(Duration::from_secs(30)));
/// assert_eq!(schedule.total(), Duration::from_secs(60));
/// # Ok::<(), respite::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetrySchedule {
    delays: Arc<[Duration]>,
    cumulative: Arc<[Duration]>,
}

impl RetrySchedule {
    /// The largest number of retries a schedule may hold.
    ///
    /// Every retry is stored with its delay and running sum, so the limit bounds the memory of a
    /// schedule to a few megabytes.
    pub const MAX_RETRIES: u32 = 100_000;

    /// Builds a schedule from `phases`, allowing at most `max_retries` retries in total.
    ///
    /// Phases are consumed in order, each contributing up to its own retry budget until the cap
    /// is reached. Phases that no longer fit are ignored. A schedule shorter than the cap is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a phase carries a negative or non-finite parameter, or when
    /// the phases and cap would yield more than [`MAX_RETRIES`][Self::MAX_RETRIES] retries. No
    /// partial schedule is returned.
    pub fn build(phases: &[RetryPhase], max_retries: u32) -> Result<Self, ConfigError> {
        for (index, phase) in phases.iter().enumerate() {
            phase.validate(index)?;
        }

        let budgets: Vec<u32> = phases
            .iter()
            .scan(max_retries, |remaining, phase| {
                let budget = phase.retries_budget().budget(*remaining);
                *remaining -= budget;
                Some(budget)
            })
            .collect();

        let len: u32 = budgets.iter().sum();
        if len > Self::MAX_RETRIES {
            return Err(ConfigError::TooManyRetries {
                retries: len,
                limit: Self::MAX_RETRIES,
            });
        }

        let mut delays: Vec<Duration> = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
        for (phase, budget) in phases.iter().zip(budgets) {
            delays.extend(phase.delays(budget));
        }

        let cumulative: Vec<Duration> = delays
            .iter()
            .scan(Duration::ZERO, |sum, delay| {
                *sum = sum.saturating_add(*delay);
                Some(*sum)
            })
            .collect();

        Ok(Self {
            delays: delays.into(),
            cumulative: cumulative.into(),
        })
    }

    /// Creates a schedule that allows no retries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            delays: Arc::from([]),
            cumulative: Arc::from([]),
        }
    }

    /// Returns the planned delay before each retry, in order.
    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Returns the running sum of [`delays`][Self::delays].
    #[must_use]
    pub fn cumulative_delays(&self) -> &[Duration] {
        &self.cumulative
    }

    /// Returns the number of retries the schedule allows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    /// Returns `true` when the schedule allows no retries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Returns the number of retries as a `u32`.
    #[must_use]
    pub fn retries(&self) -> u32 {
        // The length is bounded by a `u32` cap at build time.
        u32::try_from(self.delays.len()).unwrap_or(u32::MAX)
    }

    /// Returns the planned delay before retry `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        lookup(&self.delays, attempt)
    }

    /// Returns the total planned wait up to and including retry `attempt` (1-based).
    #[must_use]
    pub fn cumulative_delay(&self, attempt: u32) -> Option<Duration> {
        lookup(&self.cumulative, attempt)
    }

    /// Returns the total planned wait across all retries.
    ///
    /// This is the maximum age a request can reach before its last retry is issued, not counting
    /// the time spent by the attempts themselves. Zero for an empty schedule.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.cumulative.last().copied().unwrap_or(Duration::ZERO)
    }

    /// Returns the minimum age a request can reach before its last retry is issued.
    ///
    /// This is the planned delay of the last retry alone, the case where every earlier wait was
    /// fully absorbed by slow attempts. Zero for an empty schedule.
    #[must_use]
    pub fn last_delay(&self) -> Duration {
        self.delays.last().copied().unwrap_or(Duration::ZERO)
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::empty()
    }
}

fn lookup(values: &[Duration], attempt: u32) -> Option<Duration> {
    let index = usize::try_from(attempt.checked_sub(1)?).ok()?;
    values.get(index).copied()
}

/// Incremental builder for a [`RetrySchedule`].
///
/// # Examples
///
/// ```
/// use respite::{RetryPhase, ScheduleBuilder, TimeUnit};
///
/// let schedule = ScheduleBuilder::new(20)
///     .phase(RetryPhase::exponential(2.0, 2.0).retries(4))
///     .phase(RetryPhase::constant(30.0).retries(1))
///     .phase(RetryPhase::constant(1.0).unit(TimeUnit::Minutes))
///     .build()?;
///
/// assert_eq!(schedule.len(), 20);
/// # Ok::<(), respite::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    max_retries: u32,
    phases: Vec<RetryPhase>,
}

impl ScheduleBuilder {
    /// Creates a builder that caps the schedule at `max_retries` retries.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            phases: Vec::new(),
        }
    }

    /// Appends a phase.
    #[must_use]
    pub fn phase(mut self, phase: RetryPhase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Appends several phases, in order.
    #[must_use]
    pub fn phases(mut self, phases: impl IntoIterator<Item = RetryPhase>) -> Self {
        self.phases.extend(phases);
        self
    }

    /// Builds the schedule.
    ///
    /// # Errors
    ///
    /// See [`RetrySchedule::build`].
    pub fn build(&self) -> Result<RetrySchedule, ConfigError> {
        RetrySchedule::build(&self.phases, self.max_retries)
    }
}
