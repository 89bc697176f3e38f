//! Status and payment updates.

use clubstay_core::booking::{
    parse_update_target, state_machine, status_message, BookingStatus, PaymentStatus,
    CONFIRM_BLOCKING,
};
use clubstay_core::error::CoreError;
use clubstay_core::pricing::{validate_supplied, CostSource};
use clubstay_core::types::DbId;
use clubstay_db::models::booking::{Booking, StatusChange, UpdateBookingStatus, UpdatePaymentStatus};
use clubstay_db::models::resource::Resource;
use clubstay_db::repositories::{BookingRepo, ResourceRepo};

use super::assignment::{assign, AssignmentRequest};
use super::occupy;
use crate::error::AppResult;
use crate::state::AppState;

/// Move a booking to a new status.
///
/// Confirmation binds (or re-checks) the resource and occupies it;
/// rejection and cancellation release it. The booking write and the
/// occupancy write share one transaction.
pub async fn update_status(
    state: &AppState,
    booking_id: DbId,
    input: UpdateBookingStatus,
) -> AppResult<Booking> {
    let target = parse_update_target(&input.status)?;
    validate_supplied(input.total_cost)?;

    let mut tx = state.pool.begin().await?;

    let booking = BookingRepo::lock_for_update(&mut tx, booking_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        })?;
    state_machine::validate_transition(booking.status, target).map_err(CoreError::InvalidState)?;

    let mut change = StatusChange {
        status: target,
        resource_id: booking.resource_id,
        total_cost: booking.total_cost,
        cost_source: booking.cost_source,
        remarks: input.remarks,
    };
    let mut confirmed_on: Option<Resource> = None;

    if target == BookingStatus::Confirmed {
        let resource_id = match (booking.resource_id, input.resource_id) {
            (Some(bound), requested) => {
                if requested.is_some_and(|r| r != bound) {
                    tracing::info!(
                        booking_id,
                        bound_resource_id = bound,
                        requested_resource_id = ?requested,
                        "Booking already holds a resource; requested resource ignored"
                    );
                }
                bound
            }
            (None, Some(requested)) => requested,
            (None, None) => {
                return Err(CoreError::Validation(
                    "A resource must be assigned to confirm this booking".into(),
                )
                .into());
            }
        };

        let range = booking.range();
        let assignment = assign(
            &mut tx,
            &AssignmentRequest {
                resource_id,
                kind: booking.booking_type,
                site: Some(&booking.requested_site),
                category: Some(&booking.requested_category),
                occupant_category: booking.occupant_category,
                relation: booking.relation,
                range: &range,
                blocking: CONFIRM_BLOCKING,
                exclude: Some(booking.id),
            },
        )
        .await?;

        if booking.resource_id.is_none() {
            change.resource_id = Some(assignment.resource.id);
            change.total_cost = assignment.derived_cost;
            change.cost_source = CostSource::Derived;
        }
        confirmed_on = Some(assignment.resource);
    }

    if let Some(amount) = input.total_cost {
        if amount != change.total_cost {
            tracing::warn!(
                booking_id,
                supplied = amount,
                computed = change.total_cost,
                "Total cost overridden on status update"
            );
        }
        change.total_cost = amount;
        change.cost_source = CostSource::Supplied;
    }

    let updated = BookingRepo::apply_status(&mut tx, booking_id, &change).await?;

    if let Some(resource) = &confirmed_on {
        occupy(&mut tx, updated.id, resource.id, &updated.range()).await?;
    } else if matches!(target, BookingStatus::Rejected | BookingStatus::Cancelled) {
        if let Some(resource_id) = updated.resource_id {
            release(&mut tx, updated.id, resource_id).await?;
        }
    }

    tx.commit().await?;

    tracing::info!(
        booking_id,
        from = %booking.status,
        to = %updated.status,
        resource_id = ?updated.resource_id,
        total_cost = updated.total_cost,
        cost_source = %updated.cost_source,
        "Booking status updated"
    );

    if target == BookingStatus::Confirmed {
        state
            .notifications
            .notify_confirmation(&updated, confirmed_on.as_ref());
    } else {
        state
            .notifications
            .notify_status_change(&updated, status_message(target));
    }
    Ok(updated)
}

/// Set the payment flag. No resource interaction.
pub async fn update_payment(
    state: &AppState,
    booking_id: DbId,
    input: UpdatePaymentStatus,
) -> AppResult<Booking> {
    let payment_status: PaymentStatus = input.payment_status.parse()?;

    let booking = BookingRepo::set_payment(&state.pool, booking_id, payment_status)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        })?;

    tracing::info!(booking_id, payment_status = %payment_status, "Payment status updated");

    if payment_status == PaymentStatus::Paid {
        state.notifications.notify_payment_confirmed(&booking);
    }
    Ok(booking)
}

/// Free a resource after one of its bookings stopped holding it: the
/// occupancy cache is cleared along with its dates. Returns the locked
/// resource.
///
/// Other confirmed bookings on the resource are not consulted; the
/// reconcile pass restores their occupancy.
pub(super) async fn release(
    conn: &mut sqlx::PgConnection,
    booking_id: DbId,
    resource_id: DbId,
) -> AppResult<Resource> {
    let missing = || CoreError::Consistency {
        booking_id,
        resource_id: Some(resource_id),
        message: "booking references a missing resource".into(),
    };
    let resource = ResourceRepo::lock_for_update(&mut *conn, resource_id)
        .await?
        .ok_or_else(missing)?;
    if !ResourceRepo::set_occupancy(&mut *conn, resource_id, None).await? {
        return Err(missing().into());
    }
    tracing::debug!(booking_id, resource_id, "Resource occupancy cleared");
    Ok(resource)
}
