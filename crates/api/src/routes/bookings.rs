//! Route definitions for the `/bookings` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::bookings;
use crate::state::AppState;

/// Routes mounted at `/bookings`.
///
/// ```text
/// POST   /room              -> create_room_booking
/// POST   /service           -> create_service_booking
/// GET    /                  -> list_bookings
/// GET    /mine              -> list_my_bookings
/// GET    /stats             -> booking_stats
/// GET    /cancellations     -> cancellation_report
/// GET    /{id}              -> get_booking
/// PUT    /{id}/status       -> update_status
/// PUT    /{id}/payment      -> update_payment
/// PUT    /{id}/checkin      -> check_in
/// PUT    /{id}/checkout     -> check_out
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(bookings::list_bookings))
        .route("/room", post(bookings::create_room_booking))
        .route("/service", post(bookings::create_service_booking))
        .route("/mine", get(bookings::list_my_bookings))
        .route("/stats", get(bookings::booking_stats))
        .route("/cancellations", get(bookings::cancellation_report))
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/status", put(bookings::update_status))
        .route("/{id}/payment", put(bookings::update_payment))
        .route("/{id}/checkin", put(bookings::check_in))
        .route("/{id}/checkout", put(bookings::check_out))
}
