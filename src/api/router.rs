use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, cancel_booking, confirm_booking, create_booking, get_availability, get_booking,
    list_bookings, mark_picked_up, mark_returned, record_payment, revise_booking,
};

/// Creates the API router with all booking endpoints
///
/// Command endpoints (Write operations):
/// - POST /bookings - Create a new booking
/// - PUT /bookings/:id - Revise dates, items and pricing terms
/// - POST /bookings/:id/confirm - Confirm a draft
/// - POST /bookings/:id/payments - Record a payment
/// - POST /bookings/:id/pickup - Record the pickup
/// - POST /bookings/:id/return - Record the return (late fee, deposit refund)
/// - POST /bookings/:id/cancel - Cancel a booking
///
/// Query endpoints (Read operations):
/// - GET /bookings - List bookings with filters
/// - GET /bookings/:id - Get booking details
/// - GET /availability - Units free per product for a date range
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Query endpoints (Read operations)
        .route("/availability", get(get_availability))
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/:id", get(get_booking).put(revise_booking))
        // Command endpoints (Write operations)
        .route("/bookings/:id/confirm", post(confirm_booking))
        .route("/bookings/:id/payments", post(record_payment))
        .route("/bookings/:id/pickup", post(mark_picked_up))
        .route("/bookings/:id/return", post(mark_returned))
        .route("/bookings/:id/cancel", post(cancel_booking))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
