// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::time::Duration;

use tick::Clock;

use crate::rnd::Rnd;
use crate::{Jitter, RequestStart, RetriesExhausted, RetrySchedule};

/// Options that control how a [`DelayDecider`] turns the schedule into a concrete delay.
///
/// # Examples
///
/// ```
/// use respite::{DecideOptions, Jitter};
///
/// let options = DecideOptions::new()
///     .compensate_elapsed_time(true)
///     .jitter(Jitter::enabled());
///
/// assert!(options.compensates_elapsed_time());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecideOptions {
    compensate_elapsed_time: bool,
    jitter: Jitter,
}

impl DecideOptions {
    /// Creates options with compensation and jitter both turned off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discounts the time already elapsed since the first attempt from the planned wait.
    ///
    /// When enabled and the request carries a [`RequestStart`], the delay before retry `n` is
    /// the cumulative planned wait up to retry `n` minus the elapsed time, clamped at zero.
    /// Slow or timed-out attempts therefore do not cause double waiting.
    ///
    /// **Default**: false
    #[must_use]
    pub fn compensate_elapsed_time(mut self, enabled: bool) -> Self {
        self.compensate_elapsed_time = enabled;
        self
    }

    /// Sets the jitter configuration.
    ///
    /// **Default**: [`Jitter::disabled`]
    #[must_use]
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns `true` when elapsed-time compensation is enabled.
    #[must_use]
    pub fn compensates_elapsed_time(&self) -> bool {
        self.compensate_elapsed_time
    }

    /// Returns the jitter configuration.
    #[must_use]
    pub fn jitter_settings(&self) -> Jitter {
        self.jitter
    }
}

/// How a [`NextDelay`] was derived from the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DelayMode {
    /// The planned delay of the attempt, taken as is.
    Simple,

    /// The cumulative planned wait minus the time elapsed since the first attempt.
    Compensated {
        /// Time elapsed since the first attempt was issued.
        elapsed: Duration,
        /// Cumulative planned wait up to this retry.
        target: Duration,
    },

    /// Compensation was requested but the request carried no [`RequestStart`], so the planned
    /// delay was taken as is.
    Degraded,
}

impl DelayMode {
    /// Returns a short `snake_case` name for telemetry.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Compensated { .. } => "compensated",
            Self::Degraded => "degraded",
        }
    }
}

impl Display for DelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The delay to wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NextDelay {
    delay: Duration,
    jitter: Duration,
    mode: DelayMode,
}

impl NextDelay {
    /// Returns the full delay to wait, jitter included.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the random part of [`delay`][Self::delay]. Zero when no jitter was applied.
    #[must_use]
    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// Returns how the delay was derived.
    #[must_use]
    pub fn mode(&self) -> DelayMode {
        self.mode
    }
}

/// The outcome of one [`DelayDecider::next_delay`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryDecision {
    /// Wait for the given delay, then retry.
    Retry(NextDelay),

    /// The attempt number exceeds the schedule; give up and surface the last failure.
    Exhausted {
        /// Number of retries the schedule allowed.
        retries: u32,
    },
}

impl RetryDecision {
    /// Returns the delay to wait, or `None` once retries are exhausted.
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Self::Retry(next) => Some(next.delay),
            Self::Exhausted { .. } => None,
        }
    }

    /// Returns `true` once retries are exhausted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Converts the decision into the delay to wait, or the terminal signal carrying `failure`.
    ///
    /// # Errors
    ///
    /// Returns [`RetriesExhausted`] with `failure` when no retries are left.
    pub fn into_result<F>(self, failure: F) -> Result<Duration, RetriesExhausted<F>> {
        match self {
            Self::Retry(next) => Ok(next.delay),
            Self::Exhausted { retries } => Err(RetriesExhausted::new(retries, failure)),
        }
    }
}

/// Picks the delay before each retry from a precomputed [`RetrySchedule`].
///
/// The decider holds no per-request state. It reads the schedule, the attempt number and the
/// optional [`RequestStart`] of the request, and the current time of its clock. One decider can
/// serve any number of concurrent requests.
///
/// Attempt numbers are 1-based: attempt `1` is the first retry, after the original attempt
/// failed. Attempt `0` is treated as `1`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use respite::{DecideOptions, DelayDecider, RequestStart, RetryPhase, RetrySchedule};
/// use tick::ClockControl;
///
/// let control = ClockControl::new();
/// let clock = control.to_clock();
/// let schedule = RetrySchedule::build(&[RetryPhase::constant(5.0).retries(2)], 2)?;
/// let decider = DelayDecider::new(schedule, DecideOptions::new().compensate_elapsed_time(true), &clock);
///
/// let start = RequestStart::now(&clock);
/// control.advance(Duration::from_secs(7));
///
/// // 10 s planned in total up to the second retry, 7 s already spent.
/// assert_eq!(decider.next_delay(2, Some(start)).delay(), Some(Duration::from_secs(3)));
/// assert!(decider.next_delay(3, Some(start)).is_exhausted());
/// # Ok::<(), respite::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DelayDecider {
    schedule: RetrySchedule,
    options: DecideOptions,
    clock: Clock,
    rnd: Rnd,
}

impl DelayDecider {
    /// Creates a decider over `schedule` that reads the current time from `clock`.
    #[must_use]
    pub fn new(schedule: RetrySchedule, options: DecideOptions, clock: &Clock) -> Self {
        Self {
            schedule,
            options,
            clock: clock.clone(),
            rnd: Rnd::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_rnd(mut self, rnd: Rnd) -> Self {
        self.rnd = rnd;
        self
    }

    /// Returns the schedule.
    #[must_use]
    pub fn schedule(&self) -> &RetrySchedule {
        &self.schedule
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &DecideOptions {
        &self.options
    }

    /// Decides the delay before retry `attempt`.
    ///
    /// `start` is the [`RequestStart`] of the request, if the transport attached one. It is only
    /// read when elapsed-time compensation is enabled; without it the decision falls back to the
    /// planned delay and reports [`DelayMode::Degraded`].
    #[must_use]
    pub fn next_delay(&self, attempt: u32, start: Option<RequestStart>) -> RetryDecision {
        let attempt = attempt.max(1);

        let (Some(planned), Some(target)) = (self.schedule.delay(attempt), self.schedule.cumulative_delay(attempt)) else {
            return RetryDecision::Exhausted {
                retries: self.schedule.retries(),
            };
        };

        let jitter = self.options.jitter;

        let (base, mode) = match (self.options.compensate_elapsed_time, start) {
            (false, _) => (planned, DelayMode::Simple),
            (true, None) => (planned, DelayMode::Degraded),
            (true, Some(start)) => {
                let elapsed = start.elapsed(&self.clock);
                (target.saturating_sub(elapsed), DelayMode::Compensated { elapsed, target })
            }
        };

        let compensated = matches!(mode, DelayMode::Compensated { .. });
        let apply_jitter = jitter.is_enabled() && (!compensated || jitter.applies_in_compensated_mode());

        let jitter = if apply_jitter {
            jitter.sample(attempt, self.rnd)
        } else {
            Duration::ZERO
        };

        RetryDecision::Retry(NextDelay {
            delay: base.saturating_add(jitter),
            jitter,
            mode,
        })
    }
}
