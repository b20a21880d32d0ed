use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};
use std::sync::LazyLock;

pub static INTENT_VIEWS: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "paylink_intent_views_total",
        "Approval pages rendered to payer devices"
    )
    .unwrap()
});

pub static INTENTS_MINTED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "paylink_intents_minted_total",
        "Payment requests created from the dashboard"
    )
    .unwrap()
});

pub static APPROVALS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "paylink_approvals_total",
        "Approval submissions by outcome",
        &["outcome"]
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
