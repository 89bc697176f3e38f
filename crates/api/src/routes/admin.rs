//! Route definitions for the `/admin` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. All require the `admin` role.
///
/// ```text
/// POST   /occupancy/reconcile   -> reconcile_occupancy
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/occupancy/reconcile", post(admin::reconcile_occupancy))
}
