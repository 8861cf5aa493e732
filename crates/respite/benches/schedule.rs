// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![expect(missing_docs, reason = "benchmark code")]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use respite::{DecideOptions, DelayDecider, Jitter, RequestStart, RetryPhase, RetrySchedule};
use tick::Clock;

fn phases() -> Vec<RetryPhase> {
    vec![
        RetryPhase::exponential(2.0, 2.0).retries(4),
        RetryPhase::constant(30.0).retries(1),
        RetryPhase::constant(60.0),
    ]
}

fn entry(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");

    let phases = phases();
    group.bench_function("build", |b| {
        b.iter(|| RetrySchedule::build(black_box(&phases), black_box(20)));
    });

    group.bench_function("build-large", |b| {
        b.iter(|| RetrySchedule::build(black_box(&phases), black_box(10_000)));
    });

    let clock = Clock::new_frozen();
    let schedule = RetrySchedule::build(&phases, 20).unwrap();

    let simple = DelayDecider::new(schedule.clone(), DecideOptions::new(), &clock);
    group.bench_function("decide-simple", |b| {
        b.iter(|| simple.next_delay(black_box(7), None));
    });

    let jittered = DelayDecider::new(schedule.clone(), DecideOptions::new().jitter(Jitter::enabled()), &clock);
    group.bench_function("decide-jitter", |b| {
        b.iter(|| jittered.next_delay(black_box(7), None));
    });

    let compensated = DelayDecider::new(schedule, DecideOptions::new().compensate_elapsed_time(true), &clock);
    let start = RequestStart::now(&clock);
    group.bench_function("decide-compensated", |b| {
        b.iter(|| compensated.next_delay(black_box(7), Some(start)));
    });

    group.finish();
}

criterion_group!(benches, entry);
criterion_main!(benches);
