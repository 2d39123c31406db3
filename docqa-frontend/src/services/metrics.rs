use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    upload_bytes: IntCounter,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn build_metrics() -> Metrics {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("backend_requests_total", "Total number of backend requests"),
        &["operation", "status"],
    )
    .expect("metric can be created");

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "backend_request_duration_seconds",
            "Backend request duration in seconds",
        ),
        &["operation", "status"],
    )
    .expect("metric can be created");

    let upload_bytes = IntCounter::new("upload_bytes_total", "Bytes streamed to the backend")
        .expect("metric can be created");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(request_duration.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(upload_bytes.clone()))
        .expect("collector can be registered");

    Metrics {
        registry,
        requests_total,
        request_duration,
        upload_bytes,
    }
}

pub fn init_metrics() {
    METRICS.get_or_init(build_metrics);
}

/// Record one finished backend call. `status` is the HTTP status code, or
/// "error" when no response arrived. No-op until `init_metrics` has run.
pub fn record_request(operation: &str, status: &str, elapsed: Duration) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .requests_total
            .with_label_values(&[operation, status])
            .inc();
        metrics
            .request_duration
            .with_label_values(&[operation, status])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn record_upload_bytes(bytes: u64) {
    if let Some(metrics) = METRICS.get() {
        metrics.upload_bytes.inc_by(bytes);
    }
}

pub fn get_metrics() -> String {
    let Some(metrics) = METRICS.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&metrics.registry.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_requests_show_up_in_exposition() {
        init_metrics();
        record_request("/login", "200", Duration::from_millis(12));
        record_upload_bytes(1024);

        let text = get_metrics();
        assert!(text.contains("backend_requests_total"));
        assert!(text.contains("operation=\"/login\""));
        assert!(text.contains("upload_bytes_total"));
    }
}
