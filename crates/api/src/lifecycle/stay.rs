//! Check-in, check-out and occupancy reconciliation.

use clubstay_core::booking::BookingStatus;
use clubstay_core::error::CoreError;
use clubstay_core::types::DbId;
use clubstay_db::models::booking::Booking;
use clubstay_db::models::resource::{ReconcileReport, Resource};
use clubstay_db::repositories::{BookingRepo, ResourceRepo};

use super::occupy;
use super::transition::release;
use crate::error::AppResult;
use crate::state::AppState;

/// Check a confirmed booking in. The booking becomes `completed` and its
/// resource stays occupied with this booking's range.
pub async fn check_in(state: &AppState, booking_id: DbId) -> AppResult<Booking> {
    let mut tx = state.pool.begin().await?;

    let booking = BookingRepo::lock_for_update(&mut tx, booking_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        })?;

    let resource_id = match (booking.status, booking.resource_id) {
        (BookingStatus::Confirmed, Some(resource_id)) => resource_id,
        (BookingStatus::Confirmed, None) => {
            return Err(CoreError::InvalidState(
                "Booking has no assigned resource to check in to".into(),
            )
            .into());
        }
        (status, _) => {
            return Err(CoreError::InvalidState(format!(
                "Only confirmed bookings can be checked in (current status: {status})"
            ))
            .into());
        }
    };

    let resource = lock_bound(&mut tx, booking_id, resource_id).await?;
    let updated = BookingRepo::mark_checked_in(&mut tx, booking_id).await?;
    occupy(&mut tx, booking_id, resource_id, &updated.range()).await?;
    tx.commit().await?;

    tracing::info!(booking_id, resource_id, "Booking checked in");
    state.notifications.notify_check_in(&updated, Some(&resource));
    Ok(updated)
}

/// Check a completed booking out and release its resource.
///
/// Repeating the call returns the booking unchanged and leaves the
/// resource alone.
pub async fn check_out(state: &AppState, booking_id: DbId) -> AppResult<Booking> {
    let mut tx = state.pool.begin().await?;

    let booking = BookingRepo::lock_for_update(&mut tx, booking_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        })?;

    if booking.status != BookingStatus::Completed {
        return Err(CoreError::InvalidState(format!(
            "Only checked-in bookings can be checked out (current status: {})",
            booking.status
        ))
        .into());
    }

    if booking.checked_out_at.is_some() {
        tracing::debug!(booking_id, "Booking already checked out");
        return Ok(booking);
    }

    let updated = BookingRepo::mark_checked_out(&mut tx, booking_id).await?;
    let resource = match updated.resource_id {
        Some(resource_id) => Some(release(&mut tx, booking_id, resource_id).await?),
        None => None,
    };
    tx.commit().await?;

    tracing::info!(
        booking_id,
        resource_id = ?updated.resource_id,
        "Booking checked out"
    );
    state.notifications.notify_check_out(&updated, resource.as_ref());
    Ok(updated)
}

/// Compare every resource's occupancy cache with its bookings and, when
/// `repair` is set, rewrite the drifting ones.
pub async fn reconcile_occupancy(state: &AppState, repair: bool) -> AppResult<ReconcileReport> {
    let report = if repair {
        let mut tx = state.pool.begin().await?;
        let report = ResourceRepo::reconcile(&mut tx, true).await?;
        tx.commit().await?;
        report
    } else {
        let mut conn = state.pool.acquire().await?;
        ResourceRepo::reconcile(&mut conn, false).await?
    };

    for drift in &report.drift {
        tracing::warn!(
            resource_id = drift.resource_id,
            label = %drift.label,
            cached = ?drift.cached,
            expected = ?drift.expected,
            repaired = report.repaired,
            "Occupancy drift"
        );
    }
    tracing::info!(
        checked = report.checked,
        drifting = report.drift.len(),
        repaired = report.repaired,
        "Occupancy reconciliation finished"
    );
    Ok(report)
}

async fn lock_bound(
    conn: &mut sqlx::PgConnection,
    booking_id: DbId,
    resource_id: DbId,
) -> AppResult<Resource> {
    ResourceRepo::lock_for_update(conn, resource_id)
        .await?
        .ok_or_else(|| {
            CoreError::Consistency {
                booking_id,
                resource_id: Some(resource_id),
                message: "booking references a missing resource".into(),
            }
            .into()
        })
}
