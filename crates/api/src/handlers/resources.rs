//! Handlers for the `/resources` resource (rooms and event services).
//!
//! Reads are public so the booking form can list options; writes require
//! the `admin` role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use clubstay_core::availability::DateRange;
use clubstay_core::booking::{BookingType, CREATE_BLOCKING};
use clubstay_core::dates::deserialize_timestamp;
use clubstay_core::error::CoreError;
use clubstay_core::types::{DbId, Timestamp};
use clubstay_db::models::resource::{CreateResource, Resource, ResourceListQuery, UpdateResource};
use clubstay_db::repositories::{BookingRepo, ResourceRepo};

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /resources/available`.
#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub kind: BookingType,
    pub site: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub check_in: Timestamp,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub check_out: Timestamp,
}

/// Query parameters for `GET /resources/{id}/availability`.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub check_in: Timestamp,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub check_out: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub resource_id: DbId,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub inserted: u64,
    pub rooms: u64,
    pub services: u64,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/resources
pub async fn list_resources(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ResourceListQuery>,
) -> AppResult<Json<DataResponse<Vec<Resource>>>> {
    let resources = ResourceRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: resources }))
}

/// GET /api/v1/resources/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Resource>>> {
    let resource = find_resource(&state, id).await?;
    Ok(Json(DataResponse { data: resource }))
}

/// GET /api/v1/resources/available
///
/// Resources of a kind that are not blocked and have no pending or
/// confirmed booking overlapping the range.
pub async fn list_available(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AvailableQuery>,
) -> AppResult<Json<DataResponse<Vec<Resource>>>> {
    let range = DateRange::new(params.check_in, params.check_out)?;
    let resources = ResourceRepo::list_available(
        &state.pool,
        params.kind,
        params.site.as_deref(),
        params.category.as_deref(),
        &range,
        CREATE_BLOCKING,
    )
    .await?;
    Ok(Json(DataResponse { data: resources }))
}

/// GET /api/v1/resources/{id}/availability
pub async fn resource_availability(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppQuery(params): AppQuery<RangeQuery>,
) -> AppResult<Json<DataResponse<AvailabilityResponse>>> {
    let range = DateRange::new(params.check_in, params.check_out)?;
    let resource = find_resource(&state, id).await?;

    let mut conn = state.pool.acquire().await?;
    let conflict = BookingRepo::find_conflict(&mut conn, id, &range, CREATE_BLOCKING, None).await?;

    Ok(Json(DataResponse {
        data: AvailabilityResponse {
            resource_id: id,
            available: !resource.is_blocked && conflict.is_none(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Admin writes
// ---------------------------------------------------------------------------

/// POST /api/v1/resources
pub async fn create_resource(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateResource>,
) -> AppResult<(StatusCode, Json<DataResponse<Resource>>)> {
    input.validate()?;
    let resource = ResourceRepo::create(&state.pool, &input).await?;

    tracing::info!(
        resource_id = resource.id,
        kind = %resource.kind,
        label = %resource.label,
        site = %resource.site,
        admin_id = admin.user_id,
        "Resource created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: resource })))
}

/// PUT /api/v1/resources/{id}
pub async fn update_resource(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateResource>,
) -> AppResult<Json<DataResponse<Resource>>> {
    input.validate()?;
    let resource = ResourceRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Resource",
            id,
        })?;

    tracing::info!(resource_id = id, "Resource updated");
    Ok(Json(DataResponse { data: resource }))
}

/// PUT /api/v1/resources/{id}/block
///
/// Toggle the blocked flag. Existing bookings are unaffected; a blocked
/// resource cannot be bound to new or newly confirmed bookings.
pub async fn toggle_block(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Resource>>> {
    let resource = ResourceRepo::toggle_block(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Resource",
            id,
        })?;

    tracing::info!(resource_id = id, is_blocked = resource.is_blocked, "Resource block toggled");
    Ok(Json(DataResponse { data: resource }))
}

/// POST /api/v1/resources/seed
///
/// Insert the club's rooms and services; resources that already exist are
/// skipped.
pub async fn seed_resources(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SeedResponse>>> {
    let counts = ResourceRepo::seed(&state.pool).await?;
    tracing::info!(rooms = counts.rooms, services = counts.services, "Resources seeded");
    Ok(Json(DataResponse {
        data: SeedResponse {
            inserted: counts.rooms + counts.services,
            rooms: counts.rooms,
            services: counts.services,
        },
    }))
}

async fn find_resource(state: &AppState, id: DbId) -> AppResult<Resource> {
    ResourceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Resource",
                id,
            }
            .into()
        })
}
