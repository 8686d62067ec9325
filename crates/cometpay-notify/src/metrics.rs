use prometheus::{
    register_int_counter_vec, Encoder, IntCounterVec, TextEncoder,
};
use std::sync::LazyLock;

pub static NOTIFY_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "cometpay_notify_requests_total",
        "Total notification requests",
        &["result"]
    )
    .unwrap()
});

pub static SIGNATURE_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "cometpay_notify_signature_failures_total",
        "Notification signature verification failures",
        &["reason"]
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
