//! Handlers for the `/bookings` resource.
//!
//! Creation is open to non-members (room) or any authenticated requester
//! (service). Reads of a single booking are limited to administrators and
//! the booking's requester; every other write and report is admin-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use clubstay_core::error::CoreError;
use clubstay_core::types::DbId;
use clubstay_db::models::booking::{
    Booking, BookingFilter, BookingListQuery, BookingStats, CancellationReport,
    CreateRoomBooking, CreateServiceBooking, Page, UpdateBookingStatus, UpdatePaymentStatus,
};
use clubstay_db::repositories::BookingRepo;

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::lifecycle;
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/bookings/room
///
/// Submit a room booking. Works without a token (non-member, sponsor
/// required); an admin token confirms the booking immediately.
pub async fn create_room_booking(
    OptionalAuthUser(actor): OptionalAuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateRoomBooking>,
) -> AppResult<(StatusCode, Json<DataResponse<Booking>>)> {
    let booking = lifecycle::create_room_booking(&state, actor.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}

/// POST /api/v1/bookings/service
pub async fn create_service_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateServiceBooking>,
) -> AppResult<(StatusCode, Json<DataResponse<Booking>>)> {
    let booking = lifecycle::create_service_booking(&state, &auth, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}

/// GET /api/v1/bookings
pub async fn list_bookings(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<BookingListQuery>,
) -> AppResult<Json<DataResponse<Page<Booking>>>> {
    let page = BookingRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/bookings/mine
pub async fn list_my_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Booking>>>> {
    let bookings = BookingRepo::list_by_requester(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// GET /api/v1/bookings/{id}
pub async fn get_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = BookingRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Booking",
            id,
        })?;

    if !auth.is_admin() && booking.requester_id != Some(auth.user_id) {
        return Err(CoreError::Forbidden("Not allowed to view this booking".into()).into());
    }
    Ok(Json(DataResponse { data: booking }))
}

/// PUT /api/v1/bookings/{id}/status
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateBookingStatus>,
) -> AppResult<Json<DataResponse<Booking>>> {
    tracing::debug!(booking_id = id, admin_id = admin.user_id, status = %input.status, "Status update requested");
    let booking = lifecycle::update_status(&state, id, input).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// PUT /api/v1/bookings/{id}/payment
pub async fn update_payment(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdatePaymentStatus>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = lifecycle::update_payment(&state, id, input).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// PUT /api/v1/bookings/{id}/checkin
pub async fn check_in(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = lifecycle::check_in(&state, id).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// PUT /api/v1/bookings/{id}/checkout
pub async fn check_out(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = lifecycle::check_out(&state, id).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// GET /api/v1/bookings/stats
pub async fn booking_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<BookingFilter>,
) -> AppResult<Json<DataResponse<BookingStats>>> {
    let stats = BookingRepo::stats(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/bookings/cancellations
pub async fn cancellation_report(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<BookingFilter>,
) -> AppResult<Json<DataResponse<CancellationReport>>> {
    let report = BookingRepo::cancellations(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: report }))
}
