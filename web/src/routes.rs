//! Router configuration for the Voltbook API.

use crate::handlers::{availability, health, reservations, stations};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Configures all routes:
/// - Health checks
/// - Reservation lifecycle endpoints
/// - Availability queries
/// - Station registration and capacity repair
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Reservations
        .route("/reservations", post(reservations::create_reservation))
        .route("/reservations", get(reservations::list_reservations))
        .route("/reservations/:id", get(reservations::get_reservation))
        .route(
            "/reservations/:id/status",
            post(reservations::transition_status),
        )
        .route(
            "/reservations/:id/cancel",
            post(reservations::cancel_reservation),
        )
        .route(
            "/reservations/:id/reschedule",
            post(reservations::reschedule_reservation),
        )
        // Availability queries
        .route(
            "/stations/:id/availability",
            get(availability::get_availability),
        )
        .route(
            "/stations/:id/availability/:date",
            get(availability::get_day_availability),
        )
        // Station registration and repair
        .route("/stations", post(stations::register_station))
        .route("/stations/:id/repair", post(stations::repair_capacity));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
