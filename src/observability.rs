use std::net::SocketAddr;

use crate::sql::Command;

// ── Request metrics ─────────────────────────────────────────────

/// Counter: total queries executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "innkeep_queries_total";

/// Histogram: query latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "innkeep_query_duration_seconds";

// ── Booking metrics ─────────────────────────────────────────────

/// Counter: booking attempts. Labels: outcome
/// (confirmed, unavailable, payment_declined, rejected).
pub const BOOKINGS_TOTAL: &str = "innkeep_bookings_total";

/// Counter: bookings cancelled by guests or admins.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "innkeep_bookings_cancelled_total";

// ── Resource metrics ────────────────────────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "innkeep_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "innkeep_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "innkeep_connections_rejected_total";

/// Gauge: number of loaded tenants.
pub const TENANTS_ACTIVE: &str = "innkeep_tenants_active";

/// Counter: connections that failed to resolve a tenant.
pub const AUTH_FAILURES_TOTAL: &str = "innkeep_auth_failures_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "innkeep_wal_flush_duration_seconds";

/// Histogram: events per WAL flush.
pub const WAL_FLUSH_BATCH_SIZE: &str = "innkeep_wal_flush_batch_size";

/// Install the Prometheus exporter on `port`. No-op if `port` is None; an
/// exporter that cannot start is logged and the server runs without it.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics"),
        Err(e) => tracing::error!("metrics exporter on port {port} failed: {e}"),
    }
}

/// Short metric label for a command.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertHotel(_) => "insert_hotel",
        Command::UpdateHotel { .. } => "update_hotel",
        Command::DeleteHotel { .. } => "delete_hotel",
        Command::InsertRoom(_) => "insert_room",
        Command::UpdateRoom { .. } => "update_room",
        Command::DeleteRoom { .. } => "delete_room",
        Command::InsertBooking(_) => "insert_booking",
        Command::UpdateBookingStatus { .. } => "update_booking_status",
        Command::CancelBooking { .. } => "cancel_booking",
        Command::InsertReview(_) => "insert_review",
        Command::SelectHotels { .. } => "select_hotels",
        Command::SelectRooms { .. } => "select_rooms",
        Command::SelectBookings { .. } => "select_bookings",
        Command::SelectAvailability { .. } => "select_availability",
        Command::SelectReviewEligibility { .. } => "select_review_eligibility",
        Command::SelectReviews { .. } => "select_reviews",
        Command::SelectDashboard => "select_dashboard",
    }
}
