use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static ENTRIES_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "premium_registry_entries_created_total",
        "Premium entries created by add requests"
    )
    .expect("register entries_created_total")
});

pub static ENTRIES_RENEWED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "premium_registry_entries_renewed_total",
        "Existing premium entries renewed by add requests"
    )
    .expect("register entries_renewed_total")
});

pub static ENTRIES_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "premium_registry_entries_deleted_total",
        "Premium entries removed by delete requests"
    )
    .expect("register entries_deleted_total")
});

pub static ENTRIES_PURGED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "premium_registry_entries_purged_total",
        "Expired premium entries dropped while listing"
    )
    .expect("register entries_purged_total")
});

pub static AUTH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "premium_registry_auth_failures_total",
        "Mutating requests rejected for a bad api key"
    )
    .expect("register auth_failures_total")
});

pub static STORAGE_UNREADABLE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "premium_registry_storage_unreadable_total",
        "Loads that found a corrupt registry document"
    )
    .expect("register storage_unreadable_total")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("metrics encode error: {e}"))?;
    String::from_utf8(buffer).map_err(|e| format!("metrics encode error: {e}"))
}
