//! Route definitions for the `/resources` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::resources;
use crate::state::AppState;

/// Routes mounted at `/resources`.
///
/// ```text
/// GET    /                     -> list_resources
/// POST   /                     -> create_resource
/// GET    /available            -> list_available
/// POST   /seed                 -> seed_resources
/// GET    /{id}                 -> get_resource
/// PUT    /{id}                 -> update_resource
/// GET    /{id}/availability    -> resource_availability
/// PUT    /{id}/block           -> toggle_block
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route("/available", get(resources::list_available))
        .route("/seed", post(resources::seed_resources))
        .route(
            "/{id}",
            get(resources::get_resource).put(resources::update_resource),
        )
        .route("/{id}/availability", get(resources::resource_availability))
        .route("/{id}/block", put(resources::toggle_block))
}
