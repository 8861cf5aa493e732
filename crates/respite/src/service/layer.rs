// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use layered::Layer;
use recoverable::{Recovery, RecoveryInfo};

use super::{
    NotSet, OnExhausted, OnExhaustedArgs, OnRetry, OnRetryArgs, RecoveryArgs, RetryShared, ScheduledRetry, Set, ShouldRecover,
};
use crate::{Context, DecideOptions, Jitter, RetryHook, RetrySchedule};

/// Builder for the [`ScheduledRetry`] middleware.
///
/// Created by [`ScheduledRetry::layer`]. The recovery classification is required and is tracked
/// by the `S` type-state: only a `RetryLayer<_, _, Set>` implements [`Layer`].
#[derive(Debug)]
pub struct RetryLayer<In, Out, S = Set> {
    context: Context,
    name: Cow<'static, str>,
    schedule: RetrySchedule,
    options: DecideOptions,
    should_recover: Option<ShouldRecover<Out>>,
    on_retry: Option<OnRetry<Out>>,
    on_exhausted: Option<OnExhausted<Out>>,
    _state: PhantomData<fn(In, S) -> Out>,
}

impl<In, Out> RetryLayer<In, Out, NotSet> {
    pub(crate) fn new(name: Cow<'static, str>, context: &Context, schedule: RetrySchedule) -> Self {
        Self {
            context: context.clone(),
            name,
            schedule,
            options: DecideOptions::new(),
            should_recover: None,
            on_retry: None,
            on_exhausted: None,
            _state: PhantomData,
        }
    }
}

impl<In, Out, S> RetryLayer<In, Out, S> {
    /// Sets the recovery classification function.
    ///
    /// Only outputs classified as [`RecoveryKind::Retry`][recoverable::RecoveryKind::Retry] are
    /// retried. Every other classification returns the output to the caller as is.
    #[must_use]
    pub fn recovery_with(
        mut self,
        recover_fn: impl Fn(&Out, RecoveryArgs<'_>) -> RecoveryInfo + Send + Sync + 'static,
    ) -> RetryLayer<In, Out, Set> {
        self.should_recover = Some(ShouldRecover::new(recover_fn));
        self.into_state()
    }

    /// Classifies outputs through their [`Recovery`] implementation.
    #[must_use]
    pub fn recovery(self) -> RetryLayer<In, Out, Set>
    where
        Out: Recovery,
    {
        self.recovery_with(|out, _args| out.recovery())
    }

    /// Replaces the delay decision options.
    ///
    /// **Default**: no elapsed-time compensation, jitter disabled.
    #[must_use]
    pub fn options(mut self, options: DecideOptions) -> Self {
        self.options = options;
        self
    }

    /// Discounts the time spent by earlier attempts from each delay.
    #[must_use]
    pub fn compensate_elapsed_time(mut self, enabled: bool) -> Self {
        self.options = self.options.compensate_elapsed_time(enabled);
        self
    }

    /// Sets the jitter added to delays.
    #[must_use]
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.options = self.options.jitter(jitter);
        self
    }

    /// Configures a callback invoked before each wait. It observes the output that triggered
    /// the retry and does not influence the decision.
    #[must_use]
    pub fn on_retry(mut self, retry_fn: impl Fn(&Out, OnRetryArgs) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(OnRetry::new(retry_fn));
        self
    }

    /// Configures a callback invoked when the schedule has no retries left, just before the
    /// last output is returned.
    #[must_use]
    pub fn on_exhausted(mut self, exhausted_fn: impl Fn(&Out, OnExhaustedArgs) + Send + Sync + 'static) -> Self {
        self.on_exhausted = Some(OnExhausted::new(exhausted_fn));
        self
    }

    fn into_state<T>(self) -> RetryLayer<In, Out, T> {
        RetryLayer {
            context: self.context,
            name: self.name,
            schedule: self.schedule,
            options: self.options,
            should_recover: self.should_recover,
            on_retry: self.on_retry,
            on_exhausted: self.on_exhausted,
            _state: PhantomData,
        }
    }
}

impl<In, Out, S> Layer<S> for RetryLayer<In, Out, Set> {
    type Service = ScheduledRetry<In, Out, S>;

    fn layer(&self, inner: S) -> Self::Service {
        let hook = RetryHook::new(self.name.clone(), &self.context, self.schedule.clone(), self.options);

        ScheduledRetry {
            shared: Arc::new(RetryShared {
                clock: self.context.clock().clone(),
                hook,
                should_recover: self
                    .should_recover
                    .clone()
                    .unwrap_or_else(|| ShouldRecover::new(|_, _| RecoveryInfo::never())),
                on_retry: self.on_retry.clone(),
                on_exhausted: self.on_exhausted.clone(),
            }),
            inner,
            _in: PhantomData,
        }
    }
}
