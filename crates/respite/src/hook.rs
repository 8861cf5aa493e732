// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use crate::telemetry::Telemetry;
use crate::{Context, DecideOptions, DelayDecider, DelayMode, RequestStart, RetriesExhausted, RetryDecision, RetrySchedule};

/// The per-failure hook a transport calls after each failed attempt.
///
/// A hook wraps a [`DelayDecider`] and the notification sink of a [`Context`]. Creating it
/// reports a summary of the schedule. Each call to [`on_failure`][Self::on_failure] decides the
/// delay, reports it, and hands back either the delay to wait or the original failure once the
/// schedule is exhausted.
///
/// Use a hook directly when the transport has its own retry loop. With the `service` feature,
/// [`ScheduledRetry`][crate::service::ScheduledRetry] drives a hook around a `layered` service.
///
/// Cloning is cheap; clones share the schedule and telemetry.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use respite::{Context, DecideOptions, RetryHook, RetryPhase, RetrySchedule};
/// use tick::Clock;
///
/// let context = Context::new(Clock::new_frozen());
/// let schedule = RetrySchedule::build(&[RetryPhase::exponential(2.0, 2.0).retries(2)], 2)?;
/// let hook = RetryHook::new("orders", &context, schedule, DecideOptions::new());
///
/// assert_eq!(hook.on_failure(1, "503", None), Ok(Duration::from_secs(2)));
/// assert_eq!(hook.on_failure(2, "503", None), Ok(Duration::from_secs(4)));
///
/// let exhausted = hook.on_failure(3, "503", None).unwrap_err();
/// assert_eq!(exhausted.into_failure(), "503");
/// # Ok::<(), respite::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RetryHook {
    shared: Arc<HookShared>,
}

#[derive(Debug)]
struct HookShared {
    decider: DelayDecider,
    telemetry: Telemetry,
}

impl RetryHook {
    /// Creates a hook named `name` and reports the schedule summary.
    pub fn new(name: impl Into<Cow<'static, str>>, context: &Context, schedule: RetrySchedule, options: DecideOptions) -> Self {
        let decider = DelayDecider::new(schedule, options, context.clock());
        let telemetry = context.create_telemetry(name.into());
        telemetry.schedule_built(decider.schedule(), decider.options());

        Self {
            shared: Arc::new(HookShared { decider, telemetry }),
        }
    }

    /// Returns the schedule.
    #[must_use]
    pub fn schedule(&self) -> &RetrySchedule {
        self.shared.decider.schedule()
    }

    /// Returns the decision options.
    #[must_use]
    pub fn options(&self) -> &DecideOptions {
        self.shared.decider.options()
    }

    /// Decides the delay before retry `attempt` without emitting any notification.
    #[must_use]
    pub fn decide(&self, attempt: u32, start: Option<RequestStart>) -> RetryDecision {
        self.shared.decider.next_delay(attempt, start)
    }

    /// Handles the failure of the attempt preceding retry `attempt` (1-based).
    ///
    /// Returns the delay to wait before retrying, after reporting it. Once `attempt` exceeds
    /// the schedule, reports exhaustion and returns the failure wrapped in [`RetriesExhausted`].
    ///
    /// # Errors
    ///
    /// Returns [`RetriesExhausted`] carrying `failure` when no retries are left.
    pub fn on_failure<F>(&self, attempt: u32, failure: F, start: Option<RequestStart>) -> Result<Duration, RetriesExhausted<F>> {
        self.decide_and_report(attempt, start).into_result(failure)
    }

    /// Decides the delay before retry `attempt` and emits the matching notifications.
    ///
    /// Attempt `0` is reported as `1`, the attempt the decision is made for.
    pub(crate) fn decide_and_report(&self, attempt: u32, start: Option<RequestStart>) -> RetryDecision {
        let attempt = attempt.max(1);
        let decision = self.decide(attempt, start);
        let telemetry = &self.shared.telemetry;

        match &decision {
            RetryDecision::Retry(next) => {
                if next.mode() == DelayMode::Degraded {
                    telemetry.timing_missing(attempt);
                }
                telemetry.delay_computed(attempt, next);
            }
            RetryDecision::Exhausted { retries } => telemetry.retries_exhausted(attempt, *retries),
        }

        decision
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use opentelemetry::KeyValue;
    use static_assertions::assert_impl_all;
    use tick::{Clock, ClockControl};
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;
    use crate::RetryPhase;
    use crate::testing::{LogCapture, MetricTester};

    assert_impl_all!(RetryHook: Send, Sync, Clone);

    fn schedule() -> RetrySchedule {
        RetrySchedule::build(&[RetryPhase::constant(10.0).retries(2)], 2).unwrap()
    }

    #[test]
    fn returns_delays_then_failure() {
        let hook = RetryHook::new("test", &Context::new(Clock::new_frozen()), schedule(), DecideOptions::new());

        assert_eq!(hook.on_failure(1, 500, None), Ok(Duration::from_secs(10)));
        assert_eq!(hook.on_failure(2, 500, None), Ok(Duration::from_secs(10)));

        let exhausted = hook.on_failure(3, 500, None).unwrap_err();
        assert_eq!(exhausted.retries(), 2);
        assert_eq!(*exhausted.failure(), 500);
    }

    #[test]
    fn compensates_with_start_time() {
        let control = ClockControl::new();
        let context = Context::new(control.to_clock());
        let hook = RetryHook::new("test", &context, schedule(), DecideOptions::new().compensate_elapsed_time(true));

        let start = RequestStart::now(context.clock());
        control.advance(Duration::from_secs(14));

        // 20 s planned up to the second retry, 14 s spent
        assert_eq!(hook.on_failure(2, (), Some(start)), Ok(Duration::from_secs(6)));
    }

    #[test]
    fn accessors_and_decide() {
        let options = DecideOptions::new().compensate_elapsed_time(true);
        let hook = RetryHook::new("test", &Context::new(Clock::new_frozen()), schedule(), options);

        assert_eq!(hook.schedule(), &schedule());
        assert_eq!(hook.options(), &options);
        assert_eq!(hook.decide(1, None).delay(), Some(Duration::from_secs(10)));
        assert!(hook.clone().decide(3, None).is_exhausted());
    }

    #[test]
    fn emits_logs() {
        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let context = Context::new(Clock::new_frozen()).name("log_pipeline").enable_logs();
        let hook = RetryHook::new("log_retry", &context, schedule(), DecideOptions::new().compensate_elapsed_time(true));

        log_capture.assert_contains("respite.schedule");
        log_capture.assert_contains("max age of last retry will be 20.000 seconds");

        let _ = hook.on_failure(1, "boom", None);
        log_capture.assert_contains("respite.timing_missing");
        log_capture.assert_contains("respite.retry");
        log_capture.assert_contains("log_pipeline");
        log_capture.assert_contains("log_retry");
        log_capture.assert_not_contains("respite.exhausted");

        let _ = hook.on_failure(3, "boom", None);
        log_capture.assert_contains("respite.exhausted");
    }

    #[test]
    fn does_not_report_missing_timing_without_compensation() {
        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let context = Context::new(Clock::new_frozen()).enable_logs();
        let hook = RetryHook::new("test", &context, schedule(), DecideOptions::new());
        let _ = hook.on_failure(1, "boom", None);

        log_capture.assert_not_contains("respite.timing_missing");
    }

    #[cfg(not(miri))]
    #[test]
    fn emits_metrics() {
        let tester = MetricTester::new();
        let context = Context::new(Clock::new_frozen()).name("metric_pipeline").enable_metrics(tester.meter_provider());
        let hook = RetryHook::new("metric_retry", &context, schedule(), DecideOptions::new());

        let _ = hook.on_failure(1, "boom", None);
        let _ = hook.on_failure(2, "boom", None);
        let _ = hook.on_failure(3, "boom", None);

        tester.assert_attributes_contain(&[
            KeyValue::new("resilience.pipeline.name", "metric_pipeline"),
            KeyValue::new("resilience.strategy.name", "metric_retry"),
            KeyValue::new("resilience.retry.mode", "simple"),
        ]);
        assert_eq!(tester.count(&[KeyValue::new("resilience.event.name", "retry")]), 2);
        assert_eq!(
            tester.count(&[
                KeyValue::new("resilience.event.name", "retries_exhausted"),
                KeyValue::new("resilience.attempt.number", 3),
            ]),
            1
        );
    }

    #[cfg(not(miri))]
    #[test]
    fn attempt_zero_is_reported_as_first_retry() {
        let tester = MetricTester::new();
        let context = Context::new(Clock::new_frozen()).enable_metrics(tester.meter_provider());
        let hook = RetryHook::new("metric_retry", &context, schedule(), DecideOptions::new());

        assert_eq!(hook.on_failure(0, "boom", None), Ok(Duration::from_secs(10)));

        assert_eq!(tester.count(&[KeyValue::new("resilience.attempt.number", 1)]), 1);
        assert_eq!(tester.count(&[KeyValue::new("resilience.attempt.number", 0)]), 0);
    }
}
