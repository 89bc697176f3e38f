pub mod admin;
pub mod bookings;
pub mod health;
pub mod resources;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /bookings/room                          create room booking (optional auth)
/// /bookings/service                       create service booking (auth)
/// /bookings                               list (admin)
/// /bookings/mine                          requester's own bookings (auth)
/// /bookings/stats                         aggregate statistics (admin)
/// /bookings/cancellations                 cancellation report (admin)
/// /bookings/{id}                          get (admin or requester)
/// /bookings/{id}/status                   status transition (admin)
/// /bookings/{id}/payment                  payment flag (admin)
/// /bookings/{id}/checkin                  check in (admin)
/// /bookings/{id}/checkout                 check out (admin)
///
/// /resources                              list, create (create: admin)
/// /resources/available                    free resources for a range
/// /resources/seed                         seed the room layout (admin)
/// /resources/{id}                         get, update (update: admin)
/// /resources/{id}/availability            availability probe
/// /resources/{id}/block                   toggle blocked flag (admin)
///
/// /admin/occupancy/reconcile              recompute occupancy (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", bookings::router())
        .nest("/resources", resources::router())
        .nest("/admin", admin::router())
}
