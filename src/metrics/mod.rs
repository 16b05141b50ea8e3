use anyhow::Result;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("pipeline_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )?
        .install_recorder()?;

    Ok(handle)
}

#[derive(Clone)]
pub struct Metrics {
    pub prometheus_handle: PrometheusHandle,
}

impl Metrics {
    pub fn new(prometheus_handle: PrometheusHandle) -> Self {
        Self { prometheus_handle }
    }

    pub fn render(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Counts decoded listing accounts.
pub fn record_listings_fetched(count: usize) {
    ::metrics::counter!("listings_fetched_total", count as u64);
}

pub fn record_asset_hydrated() {
    ::metrics::increment_counter!("assets_hydrated_total");
}

/// A listing dropped because its metadata could not be read.
pub fn record_hydration_failure() {
    ::metrics::increment_counter!("hydration_failures_total");
}

pub fn record_pipeline_duration(duration: Duration) {
    ::metrics::histogram!("pipeline_duration_seconds", duration.as_secs_f64());
}
