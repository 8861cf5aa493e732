// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(
    not(all(feature = "service", feature = "http", feature = "logs", feature = "metrics")),
    expect(
        rustdoc::broken_intra_doc_links,
        reason = "links to feature-gated items only resolve when every optional feature is enabled"
    )
)]

//! Multi-phase retry schedules for outbound requests.
//!
//! A retry policy is an ordered list of [`RetryPhase`]s, for example "4 exponential retries
//! from 2 seconds, then a single 30 second wait, then 60 seconds forever", plus a global cap on
//! the number of retries. [`RetrySchedule::build`] flattens the phases into the exact delay
//! before each retry and the cumulative time planned up to it. A [`DelayDecider`] then picks
//! the delay before each retry of a request, optionally discounting the time the request has
//! already spent ([`DecideOptions::compensate_elapsed_time`]) and adding randomized
//! [`Jitter`].
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use respite::{DecideOptions, DelayDecider, RetryDecision, RetryPhase, RetrySchedule};
//! use tick::Clock;
//!
//! let schedule = RetrySchedule::build(
//!     &[
//!         RetryPhase::exponential(2.0, 2.0).retries(4),
//!         RetryPhase::constant(30.0).retries(1),
//!         RetryPhase::constant(60.0),
//!     ],
//!     20,
//! )?;
//!
//! assert_eq!(schedule.len(), 20);
//! assert_eq!(schedule.delay(5), Some(Duration::from_secs(30)));
//!
//! let decider = DelayDecider::new(schedule, DecideOptions::new(), &Clock::new_frozen());
//! assert_eq!(decider.next_delay(1, None).delay(), Some(Duration::from_secs(2)));
//! assert!(matches!(decider.next_delay(21, None), RetryDecision::Exhausted { retries: 20 }));
//! # Ok::<(), respite::ConfigError>(())
//! ```
//!
//! # Wiring Into a Transport
//!
//! A transport that runs its own retry loop creates a [`RetryHook`] and calls
//! [`RetryHook::on_failure`] after each failed attempt. The hook reports the schedule, every
//! delay and the final exhaustion to the telemetry configured on the [`Context`], and hands
//! the original failure back wrapped in [`RetriesExhausted`] once no retries are left.
//!
//! The start of a logical request travels with the request as a [`RequestStart`] marker,
//! attached through the [`RequestContext`] trait. With the `http` feature the trait is
//! implemented for [`http::Request`] and [`http::Extensions`].
//!
//! With the `service` feature, [`service::ScheduledRetry`] does all of this as a [`layered`]
//! middleware.
//!
//! # Configuration
//!
//! The [`config`] module holds the declarative form of a policy, deserializable with the
//! `serde` feature:
//!
//! ```json
//! {
//!   "totalRetries": 20,
//!   "includeTimeouts": true,
//!   "includeJitter": true,
//!   "phases": [
//!     { "growth": "exponential", "initialDelay": 2, "factor": 2, "totalRetries": 4 },
//!     { "growth": "constant", "retryInterval": 30, "totalRetries": 1 },
//!     { "growth": "constant", "retryInterval": 60, "totalRetries": "infinity" }
//!   ]
//! }
//! ```
//!
//! # Features
//!
//! - `logs`: emits `tracing` events for retry notifications, enabled per [`Context::enable_logs`].
//! - `metrics`: reports the OpenTelemetry `resilience.event` counter, enabled per
//!   [`Context::enable_metrics`].
//! - `serde`: derives `Serialize` and `Deserialize` for [`config`] and [`TimeUnit`].
//! - `http`: implements [`RequestContext`] for `http` types and enables
//!   [`service::classify_status`].
//! - `service`: enables the [`service`] middleware built on [`layered`] and [`recoverable`].

mod context;
mod decider;
mod error;
mod fmt;
mod hook;
mod jitter;
mod phase;
mod rnd;
mod schedule;
mod timing;
mod unit;

pub mod config;
pub mod telemetry;

#[cfg(any(feature = "service", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "service")))]
pub mod service;

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
pub(crate) mod testing;

pub use context::Context;
pub use decider::{DecideOptions, DelayDecider, DelayMode, NextDelay, RetryDecision};
pub use error::{ConfigError, RetriesExhausted};
pub use fmt::HumanDuration;
pub use hook::RetryHook;
pub use jitter::Jitter;
pub use phase::{Growth, Retries, RetryPhase};
pub use schedule::{RetrySchedule, ScheduleBuilder};
pub use timing::{RequestContext, RequestStart};
pub use unit::TimeUnit;
