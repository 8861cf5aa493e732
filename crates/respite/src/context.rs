// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use tick::Clock;

use crate::telemetry::Telemetry;

pub(crate) const DEFAULT_PIPELINE_NAME: &str = "default";

/// Shared dependencies for retry hooks and middleware.
///
/// A context carries the clock used to read the current time and to wait between attempts,
/// the pipeline name used in telemetry, and the opt-in switches for logs and metrics. Pass the
/// same context to every hook or layer of a pipeline.
///
/// # Examples
///
/// ```
/// use respite::Context;
/// use tick::Clock;
///
/// let context = Context::new(Clock::new_frozen()).name("orders");
/// assert_eq!(context.pipeline_name(), "orders");
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    clock: Clock,
    name: Cow<'static, str>,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<opentelemetry::metrics::Meter>,
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
}

impl Context {
    /// Creates a context with a clock. Initializes with `name = "default"`.
    pub fn new(clock: impl AsRef<Clock>) -> Self {
        Self {
            clock: clock.as_ref().clone(),
            name: Cow::Borrowed(DEFAULT_PIPELINE_NAME),
            #[cfg(any(feature = "metrics", test))]
            meter: None,
            #[cfg(any(feature = "logs", test))]
            logs_enabled: false,
        }
    }

    /// Sets the pipeline name for telemetry correlation. Prefer `snake_case`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables metrics reporting with the given OpenTelemetry meter provider.
    #[must_use]
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    pub fn enable_metrics(self, provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        Self {
            meter: Some(crate::telemetry::metrics::create_meter(provider)),
            ..self
        }
    }

    /// Enables structured logging of retry events through `tracing`.
    #[must_use]
    #[cfg(any(feature = "logs", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
    pub fn enable_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn create_telemetry(&self, strategy_name: Cow<'static, str>) -> Telemetry {
        Telemetry::new(
            self.name.clone(),
            strategy_name,
            #[cfg(any(feature = "metrics", test))]
            self.meter.as_ref().map(crate::telemetry::metrics::create_resilience_event_counter),
            #[cfg(any(feature = "logs", test))]
            self.logs_enabled,
        )
    }
}

impl AsRef<Clock> for Context {
    fn as_ref(&self) -> &Clock {
        &self.clock
    }
}
