// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Well-known telemetry keys.
//!
//! Retry notifications are emitted as `tracing` events (feature `logs`) and as increments of the
//! OpenTelemetry `resilience.event` counter (feature `metrics`). Both are opt-in per
//! [`Context`][crate::Context]. The constants below are the metric attribute keys.
//!
//! Names follow the [OpenTelemetry naming guidelines][naming].
//!
//! [naming]: https://opentelemetry.io/docs/specs/semconv/general/naming/#general-naming-considerations

use std::borrow::Cow;

#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;

use crate::{DecideOptions, NextDelay, RetrySchedule};

/// Key used to annotate the name of a resilience pipeline.
///
/// Examples: `user_auth`, `data_processing`, `payment_flow`.
pub const PIPELINE_NAME: &str = "resilience.pipeline.name";

/// Key used to annotate the name of a resilience strategy.
///
/// Examples: `retry`, `orders_retry`.
pub const STRATEGY_NAME: &str = "resilience.strategy.name";

/// Key used to annotate the specific resilience event being emitted: `retry` or `retries_exhausted`.
pub const EVENT_NAME: &str = "resilience.event.name";

/// Key used to annotate the 1-based retry attempt number.
pub const ATTEMPT_NUMBER: &str = "resilience.attempt.number";

/// Key used to annotate how a retry delay was derived: `simple`, `compensated` or `degraded`.
pub const RETRY_MODE: &str = "resilience.retry.mode";

#[cfg(any(feature = "metrics", test))]
pub(crate) const RETRY_EVENT: &str = "retry";

#[cfg(any(feature = "metrics", test))]
pub(crate) const RETRIES_EXHAUSTED_EVENT: &str = "retries_exhausted";

/// Emits retry notifications for one named strategy within a pipeline.
#[derive(Debug, Clone)]
pub(crate) struct Telemetry {
    #[cfg(any(feature = "metrics", feature = "logs", test))]
    pub(crate) pipeline_name: Cow<'static, str>,
    #[cfg(any(feature = "metrics", feature = "logs", test))]
    pub(crate) strategy_name: Cow<'static, str>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) event_reporter: Option<opentelemetry::metrics::Counter<u64>>,
    #[cfg(any(feature = "logs", test))]
    pub(crate) logs_enabled: bool,
}

impl Telemetry {
    #[cfg_attr(
        not(any(feature = "metrics", feature = "logs", test)),
        expect(unused_variables, reason = "unused when neither logs nor metrics are used")
    )]
    pub(crate) fn new(
        pipeline_name: Cow<'static, str>,
        strategy_name: Cow<'static, str>,
        #[cfg(any(feature = "metrics", test))] event_reporter: Option<opentelemetry::metrics::Counter<u64>>,
        #[cfg(any(feature = "logs", test))] logs_enabled: bool,
    ) -> Self {
        Self {
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            pipeline_name,
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            strategy_name,
            #[cfg(any(feature = "metrics", test))]
            event_reporter,
            #[cfg(any(feature = "logs", test))]
            logs_enabled,
        }
    }

    /// Summarizes a freshly built schedule.
    #[cfg_attr(
        not(any(feature = "logs", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when logs feature not used")
    )]
    pub(crate) fn schedule_built(&self, schedule: &RetrySchedule, options: &DecideOptions) {
        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            let max_age = crate::HumanDuration(schedule.total());
            let min_age = crate::HumanDuration(schedule.last_delay());

            tracing::event!(
                name: "respite.schedule",
                tracing::Level::INFO,
                pipeline.name = %self.pipeline_name,
                strategy.name = %self.strategy_name,
                resilience.retry.count = schedule.len(),
                resilience.retry.max_age = schedule.total().as_secs_f32(),
                resilience.retry.compensated = options.compensates_elapsed_time(),
                resilience.retry.jitter = options.jitter_settings().is_enabled(),
                "max age of last retry will be {max_age}, min age of last retry will be {min_age}",
            );
        }
    }

    /// Reports the delay chosen before retry `attempt`.
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when logs nor metrics are used")
    )]
    pub(crate) fn delay_computed(&self, attempt: u32, next: &NextDelay) {
        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            let delay = crate::HumanDuration(next.delay());

            tracing::event!(
                name: "respite.retry",
                tracing::Level::WARN,
                pipeline.name = %self.pipeline_name,
                strategy.name = %self.strategy_name,
                resilience.attempt.number = attempt,
                resilience.retry.delay = next.delay().as_secs_f32(),
                resilience.retry.jitter = next.jitter().as_secs_f32(),
                resilience.retry.mode = next.mode().as_str(),
                "attempt {attempt} failed, next retry will be after {delay}",
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report_metrics(RETRY_EVENT, attempt, Some(next.mode().as_str()));
    }

    /// Reports that compensation was requested but the request carried no start marker.
    #[cfg_attr(
        not(any(feature = "logs", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when logs feature not used")
    )]
    pub(crate) fn timing_missing(&self, attempt: u32) {
        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            tracing::event!(
                name: "respite.timing_missing",
                tracing::Level::WARN,
                pipeline.name = %self.pipeline_name,
                strategy.name = %self.strategy_name,
                resilience.attempt.number = attempt,
                "request start time missing, elapsed time is not compensated",
            );
        }
    }

    /// Reports that no retries are left after attempt `attempt` failed.
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when logs nor metrics are used")
    )]
    #[cfg_attr(
        all(feature = "metrics", not(any(feature = "logs", test))),
        expect(unused_variables, reason = "the retry count is only logged")
    )]
    pub(crate) fn retries_exhausted(&self, attempt: u32, retries: u32) {
        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            tracing::event!(
                name: "respite.exhausted",
                tracing::Level::ERROR,
                pipeline.name = %self.pipeline_name,
                strategy.name = %self.strategy_name,
                resilience.attempt.number = attempt,
                resilience.retry.count = retries,
                "max retry attempts exceeded",
            );
        }

        #[cfg(any(feature = "metrics", test))]
        self.report_metrics(RETRIES_EXHAUSTED_EVENT, attempt, None);
    }

    #[cfg(any(feature = "metrics", test))]
    fn report_metrics(&self, event: &'static str, attempt: u32, mode: Option<&'static str>) {
        use opentelemetry::KeyValue;

        let Some(reporter) = &self.event_reporter else {
            return;
        };

        let mut attributes = vec![
            KeyValue::new(PIPELINE_NAME, self.pipeline_name.clone()),
            KeyValue::new(STRATEGY_NAME, self.strategy_name.clone()),
            KeyValue::new(EVENT_NAME, event),
            KeyValue::new(ATTEMPT_NUMBER, i64::from(attempt)),
        ];

        if let Some(mode) = mode {
            attributes.push(KeyValue::new(RETRY_MODE, mode));
        }

        reporter.add(1, &attributes);
    }
}
