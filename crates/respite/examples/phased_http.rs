// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Phased retry policy around a flaky HTTP endpoint.
//!
//! Four exponential retries from 2 seconds, one 30 second wait, then 60 seconds forever, capped
//! at 20 retries. Timeouts are compensated and jitter is enabled. Time is simulated so the
//! example finishes instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use http::{Request, StatusCode};
use layered::{Execute, Service, Stack};
use respite::service::{ScheduledRetry, classify_status};
use respite::{Context, DecideOptions, Jitter, RetryPhase, RetrySchedule};
use tick::ClockControl;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let control = ClockControl::new().auto_advance_timers(true);
    let clock = control.to_clock();
    let context = Context::new(&clock).name("phased_http").enable_logs();

    let schedule = RetrySchedule::build(
        &[
            RetryPhase::exponential(2.0, 2.0).retries(4),
            RetryPhase::constant(30.0).retries(1),
            RetryPhase::constant(60.0),
        ],
        20,
    )?;

    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = Arc::clone(&attempts);

    let stack = (
        ScheduledRetry::layer("flaky_endpoint", &context, schedule)
            .options(DecideOptions::new().compensate_elapsed_time(true).jitter(Jitter::enabled()))
            .recovery_with(|status: &StatusCode, _| classify_status(*status))
            .on_retry(|status, args| println!("{status}: retry {} in {:?} ({})", args.attempt(), args.retry_delay(), args.mode())),
        Execute::new(move |request: Request<&'static str>| {
            // every attempt takes a second; the endpoint recovers on the seventh
            control.advance(Duration::from_secs(1));
            let attempt = attempts_clone.fetch_add(1, Ordering::SeqCst);
            println!("{} {} (attempt {attempt})", request.method(), request.uri());
            async move {
                if attempt < 6 {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::OK
                }
            }
        }),
    );

    let service = stack.into_service();
    let request = Request::get("https://example.com/orders").body("")?;
    let status = service.execute(request).await;

    println!("finished with {status} after {} attempts", attempts.load(Ordering::SeqCst));
    Ok(())
}
