// Prometheus metrics for the playground API

use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref EXECUTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("playground_executions_total", "Code executions by language and outcome"),
        &["language", "outcome"]
    )
    .expect("valid executions_total metric");

    pub static ref EXECUTION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "playground_execution_duration_seconds",
            "Wall-clock time from submission to final poll"
        )
        .buckets(vec![0.5, 1.0, 2.0, 4.0, 8.0, 16.0]),
        &["language"]
    )
    .expect("valid execution_duration metric");

    pub static ref ASSISTANT_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("playground_assistant_requests_total", "Assistant calls by kind and outcome"),
        &["kind", "outcome"]
    )
    .expect("valid assistant_requests metric");

    static ref REGISTRY: Registry = {
        let registry = Registry::new();
        registry
            .register(Box::new(EXECUTIONS_TOTAL.clone()))
            .expect("register executions_total");
        registry
            .register(Box::new(EXECUTION_SECONDS.clone()))
            .expect("register execution_duration");
        registry
            .register(Box::new(ASSISTANT_REQUESTS_TOTAL.clone()))
            .expect("register assistant_requests");
        registry
    };
}

/// Outcome label for a run
pub fn outcome_label<T, E>(result: &Result<T, E>, finished: impl Fn(&T) -> bool) -> &'static str {
    match result {
        Ok(value) if finished(value) => "completed",
        Ok(_) => "poll_budget_exhausted",
        Err(_) => "error",
    }
}

/// Render all metrics in the Prometheus text format
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
