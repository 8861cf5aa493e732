// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use tick::Clock;

use crate::{DelayMode, NextDelay};

/// Arguments for the [`recovery_with`][super::RetryLayer::recovery_with] callback.
#[derive(Debug)]
pub struct RecoveryArgs<'a> {
    pub(super) attempt: u32,
    pub(super) clock: &'a Clock,
}

impl RecoveryArgs<'_> {
    /// Returns the 0-based index of the attempt that produced the output. `0` is the original
    /// request, `1` the first retry.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the clock used by the middleware.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        self.clock
    }
}

/// Arguments for the [`on_retry`][super::RetryLayer::on_retry] callback.
#[derive(Debug)]
pub struct OnRetryArgs {
    pub(super) attempt: u32,
    pub(super) next: NextDelay,
}

impl OnRetryArgs {
    /// Returns the 1-based number of the retry about to be scheduled.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the delay before the retry, jitter included.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.next.delay()
    }

    /// Returns how the delay was derived.
    #[must_use]
    pub fn mode(&self) -> DelayMode {
        self.next.mode()
    }

    /// Returns the full delay decision.
    #[must_use]
    pub fn next_delay(&self) -> &NextDelay {
        &self.next
    }
}

/// Arguments for the [`on_exhausted`][super::RetryLayer::on_exhausted] callback.
#[derive(Debug)]
pub struct OnExhaustedArgs {
    pub(super) attempt: u32,
    pub(super) retries: u32,
}

impl OnExhaustedArgs {
    /// Returns the 1-based number of the retry that was refused.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the number of retries the schedule allowed.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }
}
