// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use layered::Service;
use recoverable::RecoveryKind;
use tick::Clock;

use super::{NotSet, OnExhausted, OnExhaustedArgs, OnRetry, OnRetryArgs, RecoveryArgs, RetryLayer, ShouldRecover};
use crate::{Context, RequestContext, RequestStart, RetryDecision, RetryHook, RetrySchedule};

/// Retries a wrapped service along a [`RetrySchedule`].
///
/// The middleware attaches a [`RequestStart`] marker to the request before the first attempt,
/// classifies each output with the configured recovery function and waits the delay decided by
/// a [`RetryHook`] before calling the inner service again with a clone of the request. Once the
/// schedule is exhausted the last output is returned unchanged.
///
/// Configure it through [`ScheduledRetry::layer`].
#[derive(Debug)]
pub struct ScheduledRetry<In, Out, S> {
    pub(super) shared: Arc<RetryShared<Out>>,
    pub(super) inner: S,
    pub(super) _in: PhantomData<fn(In)>,
}

#[derive(Debug)]
pub(crate) struct RetryShared<Out> {
    pub(crate) clock: Clock,
    pub(crate) hook: RetryHook,
    pub(crate) should_recover: ShouldRecover<Out>,
    pub(crate) on_retry: Option<OnRetry<Out>>,
    pub(crate) on_exhausted: Option<OnExhausted<Out>>,
}

impl<In, Out, S: Clone> Clone for ScheduledRetry<In, Out, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
            _in: PhantomData,
        }
    }
}

impl<In, Out> ScheduledRetry<In, Out, ()> {
    /// Starts configuring a retry middleware named `name` that follows `schedule`.
    ///
    /// The returned [`RetryLayer`] needs a recovery classification before it can wrap a service.
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &Context, schedule: RetrySchedule) -> RetryLayer<In, Out, NotSet> {
        RetryLayer::new(name.into(), context, schedule)
    }
}

impl<In, Out, S> Service<In> for ScheduledRetry<In, Out, S>
where
    In: RequestContext + Clone + Send,
    Out: Send,
    S: Service<In, Out = Out>,
{
    type Out = Out;

    #[cfg_attr(test, mutants::skip)] // Mutating the attempt increment causes infinite loops
    async fn execute(&self, mut input: In) -> Self::Out {
        let start = input.stamp_request_start(&self.shared.clock);
        let mut attempt = 0;

        loop {
            let out = self.inner.execute(input.clone()).await;

            match self.shared.evaluate_attempt(out, attempt, start) {
                ControlFlow::Continue(delay) => {
                    self.shared.clock.delay(delay).await;
                    attempt += 1;
                }
                ControlFlow::Break(out) => return out,
            }
        }
    }
}

impl<Out> RetryShared<Out> {
    fn evaluate_attempt(&self, out: Out, attempt: u32, start: RequestStart) -> ControlFlow<Out, Duration> {
        let recovery = self.should_recover.call(&out, RecoveryArgs { attempt, clock: &self.clock });

        if recovery.kind() != RecoveryKind::Retry {
            return ControlFlow::Break(out);
        }

        let retry = attempt.saturating_add(1);

        match self.hook.decide_and_report(retry, Some(start)) {
            RetryDecision::Retry(next) => {
                if let Some(on_retry) = &self.on_retry {
                    on_retry.call(&out, OnRetryArgs { attempt: retry, next });
                }

                ControlFlow::Continue(next.delay())
            }
            RetryDecision::Exhausted { retries } => {
                if let Some(on_exhausted) = &self.on_exhausted {
                    on_exhausted.call(&out, OnExhaustedArgs { attempt: retry, retries });
                }

                ControlFlow::Break(out)
            }
        }
    }
}
