//! Handlers for the `/admin` resource (operational maintenance).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use clubstay_db::models::resource::ReconcileReport;

use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::lifecycle;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `POST /admin/occupancy/reconcile`.
#[derive(Debug, Deserialize)]
pub struct ReconcileParams {
    /// Rewrite drifting caches instead of only reporting them.
    #[serde(default)]
    pub repair: bool,
}

/// POST /api/v1/admin/occupancy/reconcile
///
/// Recompute every resource's occupancy from its bookings and report the
/// ones whose cache disagrees.
pub async fn reconcile_occupancy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ReconcileParams>,
) -> AppResult<Json<DataResponse<ReconcileReport>>> {
    tracing::info!(admin_id = admin.user_id, repair = params.repair, "Occupancy reconciliation requested");
    let report = lifecycle::reconcile_occupancy(&state, params.repair).await?;
    Ok(Json(DataResponse { data: report }))
}
