// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! OpenTelemetry instruments for retry notifications.

use opentelemetry::InstrumentationScope;
use opentelemetry::metrics::{Counter, Meter, MeterProvider};

const SCOPE_NAME: &str = "respite";
const SCOPE_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";

/// Name of the counter incremented for every scheduled retry and every exhausted schedule.
pub(crate) const RESILIENCE_EVENT: &str = "resilience.event";

/// Creates the meter shared by every hook of a [`Context`][crate::Context].
pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    let scope = InstrumentationScope::builder(SCOPE_NAME)
        .with_version(SCOPE_VERSION)
        .with_schema_url(SCHEMA_URL)
        .build();

    meter_provider.meter_with_scope(scope)
}

/// Creates the counter a hook reports `retry` and `retries_exhausted` events to.
pub(crate) fn create_resilience_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter(RESILIENCE_EVENT)
        .with_description("Counts scheduled retries and exhausted retry schedules.")
        .with_unit("{event}")
        .build()
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};

    use super::*;

    #[test]
    fn counter_carries_scope_and_description() {
        let exporter = InMemoryMetricExporter::default();
        let meter_provider = SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build();

        let counter = create_resilience_event_counter(&create_meter(&meter_provider));
        counter.add(1, &[]);
        meter_provider.force_flush().unwrap();

        let exported = format!("{:?}", exporter.get_finished_metrics().unwrap());

        assert!(exported.contains(RESILIENCE_EVENT));
        assert!(exported.contains("Counts scheduled retries and exhausted retry schedules."));
        assert!(exported.contains("{event}"));
        assert!(exported.contains(SCOPE_NAME));
        assert!(exported.contains(SCOPE_VERSION));
        assert!(exported.contains(SCHEMA_URL));
    }
}
