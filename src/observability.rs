use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total query-API calls. Labels: query, status.
pub const QUERIES_TOTAL: &str = "timegrid_queries_total";

/// Histogram: query latency in seconds. Labels: query.
pub const QUERY_DURATION_SECONDS: &str = "timegrid_query_duration_seconds";

/// Counter: bookings committed through the write guard.
pub const BOOKINGS_CREATED_TOTAL: &str = "timegrid_bookings_created_total";

/// Counter: bookings rejected by the commit-time conflict guard.
pub const BOOKING_CONFLICTS_TOTAL: &str = "timegrid_booking_conflicts_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: resource calendars held in the directory.
pub const RESOURCES_ACTIVE: &str = "timegrid_resources_active";

/// Install the Prometheus metrics exporter on the given port. No-op if
/// port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
