// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::rnd::Rnd;

pub(crate) const DEFAULT_JITTER_UNIT: Duration = Duration::from_millis(100);
pub(crate) const DEFAULT_JITTER_CAP: Duration = Duration::from_millis(1000);

/// Bounded random addition to a retry delay.
///
/// The jitter added before retry `n` is drawn uniformly from `[0, min(cap, unit * n))`, so the
/// spread grows with the attempt number until it reaches the cap. Jitter is disabled by default.
///
/// By default jitter is only added when the delay is taken straight from the schedule. Delays
/// computed from elapsed time already vary with the duration of each attempt; use
/// [`in_compensated_mode`][Self::in_compensated_mode] to jitter those as well.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use respite::Jitter;
///
/// let jitter = Jitter::enabled().cap(Duration::from_millis(500));
///
/// assert_eq!(jitter.bound(3), Duration::from_millis(300));
/// assert_eq!(jitter.bound(8), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Jitter {
    enabled: bool,
    unit: Duration,
    cap: Duration,
    in_compensated_mode: bool,
}

impl Jitter {
    /// Returns jitter with the default bounds, turned off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            unit: DEFAULT_JITTER_UNIT,
            cap: DEFAULT_JITTER_CAP,
            in_compensated_mode: false,
        }
    }

    /// Returns jitter with the default bounds of 100 ms per attempt up to 1 s, turned on.
    #[must_use]
    pub const fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::disabled()
        }
    }

    /// Turns jitter on or off.
    #[must_use]
    pub const fn enable(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the spread added per attempt.
    ///
    /// **Default**: 100 ms
    #[must_use]
    pub const fn unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the largest spread regardless of attempt number.
    ///
    /// **Default**: 1 s
    #[must_use]
    pub const fn cap(mut self, cap: Duration) -> Self {
        self.cap = cap;
        self
    }

    /// Also adds jitter to delays computed from elapsed time.
    ///
    /// The jitter is added after the compensated delay has been clamped at zero.
    ///
    /// **Default**: false
    #[must_use]
    pub const fn in_compensated_mode(mut self, enabled: bool) -> Self {
        self.in_compensated_mode = enabled;
        self
    }

    /// Returns `true` when jitter is turned on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` when jitter also applies to compensated delays.
    #[must_use]
    pub const fn applies_in_compensated_mode(&self) -> bool {
        self.in_compensated_mode
    }

    /// Returns the exclusive upper bound of the jitter added before retry `attempt`.
    #[must_use]
    pub fn bound(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt.max(1)).min(self.cap)
    }

    pub(crate) fn sample(&self, attempt: u32, rnd: Rnd) -> Duration {
        let fraction = rnd.fraction();
        if !(0.0..1.0).contains(&fraction) {
            return Duration::ZERO;
        }

        let bound_nanos = u64::try_from(self.bound(attempt).as_nanos()).unwrap_or(u64::MAX);

        #[expect(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "fraction is in [0, 1) so the product fits the bound"
        )]
        let nanos = (bound_nanos as f64 * fraction) as u64;

        Duration::from_nanos(nanos)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::disabled()
    }
}
