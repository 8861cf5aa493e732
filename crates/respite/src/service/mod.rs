// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Retry middleware for [`layered`] services driven by a [`RetrySchedule`][crate::RetrySchedule].
//!
//! [`ScheduledRetry`] wraps an inner service. It stamps each request with a
//! [`RequestStart`][crate::RequestStart], classifies outputs with a recovery function and waits
//! the delays decided by a [`RetryHook`][crate::RetryHook] between attempts.
//!
//! # Quick Start
//!
//! ```
//! use layered::{Execute, Service, Stack};
//! use recoverable::RecoveryInfo;
//! use respite::service::ScheduledRetry;
//! use respite::{Context, RequestContext, RequestStart, RetryPhase, RetrySchedule};
//! use tick::Clock;
//!
//! #[derive(Clone, Default)]
//! struct Call {
//!     start: Option<RequestStart>,
//! }
//!
//! impl RequestContext for Call {
//!     fn request_start(&self) -> Option<RequestStart> {
//!         self.start
//!     }
//!
//!     fn set_request_start(&mut self, start: RequestStart) {
//!         self.start = Some(start);
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let context = Context::new(Clock::new_frozen()).name("orders");
//! let schedule = RetrySchedule::build(&[RetryPhase::exponential(2.0, 2.0).retries(4), RetryPhase::constant(60.0)], 20)?;
//!
//! let stack = (
//!     ScheduledRetry::layer("orders_retry", &context, schedule)
//!         .compensate_elapsed_time(true)
//!         .recovery_with(|status: &u16, _| if *status >= 500 { RecoveryInfo::retry() } else { RecoveryInfo::never() }),
//!     Execute::new(|_call: Call| async { 200_u16 }),
//! );
//!
//! let service = stack.into_service();
//! assert_eq!(service.execute(Call::default()).await, 200);
//! # Ok::<(), respite::ConfigError>(())
//! # })?;
//! # Ok::<(), respite::ConfigError>(())
//! ```
//!
//! With the `http` feature, [`http::Request`] implements [`RequestContext`][crate::RequestContext]
//! and can be passed through the middleware directly.
//!
//! # Configuration
//!
//! [`RetryLayer`] uses a type state to require a recovery classification before it can wrap a
//! service. Use [`recovery_with`][RetryLayer::recovery_with] for a custom function,
//! [`recovery`][RetryLayer::recovery] when the output implements
//! [`Recovery`][recoverable::Recovery], or [`classify_status`] for HTTP statuses.
//!
//! | Parameter | Default | Configured By |
//! |-----------|---------|---------------|
//! | Elapsed-time compensation | off | [`compensate_elapsed_time`][RetryLayer::compensate_elapsed_time] |
//! | Jitter | off | [`jitter`][RetryLayer::jitter], [`options`][RetryLayer::options] |
//! | Retry callback | none | [`on_retry`][RetryLayer::on_retry] |
//! | Exhaustion callback | none | [`on_exhausted`][RetryLayer::on_exhausted] |

mod args;
mod callback;
#[cfg(any(feature = "http", test))]
mod classify;
mod layer;
mod retry;

pub use args::{OnExhaustedArgs, OnRetryArgs, RecoveryArgs};
pub(crate) use callback::{OnExhausted, OnRetry, ShouldRecover};
#[cfg(any(feature = "http", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub use classify::classify_status;
pub use layer::RetryLayer;
pub(crate) use retry::RetryShared;
pub use retry::ScheduledRetry;

/// A flag indicating that the required property is set.
#[non_exhaustive]
#[derive(Debug)]
pub struct Set;

/// A flag indicating that the required property has not been set.
#[non_exhaustive]
#[derive(Debug)]
pub struct NotSet;
