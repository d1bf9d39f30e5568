use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: bookings created (pending requests accepted into the store).
pub const BOOKINGS_CREATED_TOTAL: &str = "arriba_bookings_created_total";

/// Counter: bookings accepted (spans committed to the calendar).
pub const BOOKINGS_ACCEPTED_TOTAL: &str = "arriba_bookings_accepted_total";

/// Counter: bookings completed.
pub const BOOKINGS_COMPLETED_TOTAL: &str = "arriba_bookings_completed_total";

/// Counter: bookings deleted, singly or in bulk.
pub const BOOKINGS_DELETED_TOTAL: &str = "arriba_bookings_deleted_total";

/// Counter: booking requests rejected by validation.
pub const VALIDATION_FAILURES_TOTAL: &str = "arriba_validation_failures_total";

// ── USE metrics (store-facing) ──────────────────────────────────

/// Histogram: full availability snapshot load latency in seconds.
pub const SNAPSHOT_LOAD_DURATION_SECONDS: &str = "arriba_snapshot_load_duration_seconds";

/// Histogram: per-span availability fan-out latency in seconds.
pub const AVAILABILITY_WRITE_DURATION_SECONDS: &str = "arriba_availability_write_duration_seconds";

/// Counter: individual per-date writes that failed or timed out.
pub const STORE_WRITE_FAILURES_TOTAL: &str = "arriba_store_write_failures_total";

/// Counter: admin sign-in failures.
pub const AUTH_FAILURES_TOTAL: &str = "arriba_auth_failures_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
