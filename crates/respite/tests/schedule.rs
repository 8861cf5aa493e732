// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is a test module")]

//! Schedule and delay properties exercised through the public API only.

use std::time::{Duration, SystemTime};

use respite::{
    ConfigError, DecideOptions, DelayDecider, DelayMode, Jitter, RequestStart, RetryDecision, RetryHook, RetryPhase, RetrySchedule,
    ScheduleBuilder, TimeUnit,
};
use tick::{Clock, ClockControl};

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}

fn phased() -> Vec<RetryPhase> {
    vec![
        RetryPhase::exponential(2.0, 2.0).retries(4),
        RetryPhase::constant(30.0).retries(1),
        RetryPhase::constant(60.0),
    ]
}

#[test]
fn exponential_phase() {
    let schedule = RetrySchedule::build(&[RetryPhase::exponential(2.0, 2.0).retries(4)], 10).unwrap();

    assert_eq!(schedule.delays(), secs(&[2, 4, 8, 16]));
}

#[test]
fn constant_phase_is_appended() {
    let schedule = RetrySchedule::build(&phased()[..2], 5).unwrap();

    assert_eq!(schedule.delays(), secs(&[2, 4, 8, 16, 30]));
    assert_eq!(schedule.cumulative_delays(), secs(&[2, 6, 14, 30, 60]));
}

#[test]
fn cap_truncates() {
    let schedule = RetrySchedule::build(&phased(), 2).unwrap();

    assert_eq!(schedule.delays(), secs(&[2, 4]));
}

#[test]
fn length_is_capped_sum_of_budgets() {
    let phases = [RetryPhase::linear(1.0).retries(3), RetryPhase::constant(5.0).retries(2)];

    for cap in 0..10 {
        let schedule = RetrySchedule::build(&phases, cap).unwrap();
        assert_eq!(schedule.retries(), cap.min(5));
    }
}

#[test]
fn unbounded_phase_fills_to_cap() {
    let schedule = RetrySchedule::build(&phased(), 20).unwrap();

    assert_eq!(schedule.len(), 20);
    assert_eq!(schedule.delay(20), Some(Duration::from_secs(60)));
    assert_eq!(schedule.total(), Duration::from_secs(60 + 15 * 60));
}

#[test]
fn cumulative_delays_are_running_sum() {
    let schedule = RetrySchedule::build(
        &[
            RetryPhase::exponential(0.5, 3.0).retries(5).unit(TimeUnit::Minutes),
            RetryPhase::constant(0.0).retries(2),
            RetryPhase::linear(1.0).unit(TimeUnit::Hours),
        ],
        12,
    )
    .unwrap();

    let mut sum = Duration::ZERO;
    for (delay, cumulative) in schedule.delays().iter().zip(schedule.cumulative_delays()) {
        sum += *delay;
        assert_eq!(*cumulative, sum);
    }

    assert!(schedule.cumulative_delays().windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn empty_inputs_give_empty_schedule() {
    assert!(RetrySchedule::build(&[], 10).unwrap().is_empty());
    assert!(RetrySchedule::build(&phased(), 0).unwrap().is_empty());
    assert_eq!(RetrySchedule::build(&[], 10).unwrap(), RetrySchedule::empty());
}

#[test]
fn build_is_idempotent() {
    let first = RetrySchedule::build(&phased(), 20).unwrap();
    let second = ScheduleBuilder::new(20).phases(phased()).build().unwrap();

    assert_eq!(first, second);
}

#[test]
fn invalid_phase_fails_the_whole_build() {
    let error = RetrySchedule::build(&[RetryPhase::constant(1.0).retries(1), RetryPhase::exponential(f64::NAN, 2.0)], 1).unwrap_err();

    assert!(matches!(error, ConfigError::InvalidParameter { phase: 1, .. }));
}

#[test]
fn compensated_delay() {
    let control = ClockControl::new();
    let clock = control.to_clock();
    let schedule = RetrySchedule::build(&[RetryPhase::constant(5.0).retries(2)], 2).unwrap();
    let decider = DelayDecider::new(schedule, DecideOptions::new().compensate_elapsed_time(true), &clock);
    let start = RequestStart::now(&clock);

    control.advance(Duration::from_secs(7));
    assert_eq!(decider.next_delay(2, Some(start)).delay(), Some(Duration::from_secs(3)));

    control.advance(Duration::from_secs(5));
    assert_eq!(decider.next_delay(2, Some(start)).delay(), Some(Duration::ZERO));
}

#[test]
fn missing_start_degrades_to_planned_delay() {
    let schedule = RetrySchedule::build(&[RetryPhase::constant(5.0).retries(2)], 2).unwrap();
    let decider = DelayDecider::new(schedule, DecideOptions::new().compensate_elapsed_time(true), &Clock::new_frozen());

    let RetryDecision::Retry(next) = decider.next_delay(1, None) else {
        panic!("expected a retry");
    };

    assert_eq!(next.delay(), Duration::from_secs(5));
    assert_eq!(next.mode(), DelayMode::Degraded);
}

#[test]
fn jitter_stays_within_bound() {
    let schedule = RetrySchedule::build(&[RetryPhase::constant(1.0)], 30).unwrap();
    let jitter = Jitter::enabled();
    let decider = DelayDecider::new(schedule, DecideOptions::new().jitter(jitter), &Clock::new_frozen());

    for attempt in 1..=30 {
        for _ in 0..20 {
            let RetryDecision::Retry(next) = decider.next_delay(attempt, None) else {
                panic!("expected a retry");
            };

            assert!(next.jitter() < jitter.bound(attempt));
            assert_eq!(next.delay(), Duration::from_secs(1) + next.jitter());
        }
    }
}

#[test]
fn attempts_past_the_schedule_are_terminal() {
    let schedule = RetrySchedule::build(&phased()[..2], 5).unwrap();
    let decider = DelayDecider::new(schedule, DecideOptions::new(), &Clock::new_frozen());

    for attempt in [6, 7, 100, u32::MAX] {
        assert_eq!(decider.next_delay(attempt, None), RetryDecision::Exhausted { retries: 5 });
    }
}

#[test]
fn hook_surfaces_original_failure() {
    let context = respite::Context::new(Clock::new_frozen_at(SystemTime::UNIX_EPOCH));
    let hook = RetryHook::new("test", &context, RetrySchedule::build(&phased(), 1).unwrap(), DecideOptions::new());

    assert_eq!(hook.on_failure(1, std::io::ErrorKind::TimedOut, None), Ok(Duration::from_secs(2)));

    let exhausted = hook.on_failure(2, std::io::ErrorKind::TimedOut, None).unwrap_err();
    assert_eq!(exhausted.retries(), 1);
    assert_eq!(exhausted.into_failure(), std::io::ErrorKind::TimedOut);
}
