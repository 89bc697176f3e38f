//! Room and service booking creation.

use sqlx::PgConnection;
use validator::Validate;
use clubstay_core::availability::DateRange;
use clubstay_core::booking::{
    requires_resource_at_creation, validate_relation, BookingStatus, BookingType,
    OccupantCategory, Relation, CREATE_BLOCKING,
};
use clubstay_core::error::CoreError;
use clubstay_core::pricing::{resolve_cost, validate_supplied};
use clubstay_core::types::DbId;
use clubstay_db::models::booking::{
    Booking, CreateRoomBooking, CreateServiceBooking, NewBooking, SponsorDetails,
};
use clubstay_db::models::resource::Resource;
use clubstay_db::repositories::BookingRepo;

use super::assignment::{assign, Assignment, AssignmentRequest};
use super::{audit_discarded_cost, occupy};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Create a room booking.
///
/// `actor` is `None` for non-member requests. Administrators' bookings are
/// confirmed immediately and occupy the room in the same commit; everyone
/// else's start `pending`.
pub async fn create_room_booking(
    state: &AppState,
    actor: Option<&AuthUser>,
    input: CreateRoomBooking,
) -> AppResult<Booking> {
    input.validate()?;
    validate_relation(input.occupant_category, input.relation)?;
    let range = DateRange::new(input.check_in, input.check_out)?;
    validate_supplied(input.total_cost)?;

    let is_admin = actor.is_some_and(AuthUser::is_admin);
    let requester_id = actor.map(|a| a.user_id);

    if input.resource_id.is_none()
        && requires_resource_at_creation(input.occupant_category, input.relation, is_admin)
    {
        return Err(CoreError::Validation("A room must be selected for this booking".into()).into());
    }
    require_sponsor(requester_id, input.sponsor.as_ref())?;

    let mut tx = state.pool.begin().await?;

    let assignment = match input.resource_id {
        Some(resource_id) => Some(
            assign(
                &mut tx,
                &AssignmentRequest {
                    resource_id,
                    kind: BookingType::Room,
                    site: Some(input.site.trim()),
                    category: Some(input.category.trim()),
                    occupant_category: input.occupant_category,
                    relation: input.relation,
                    range: &range,
                    blocking: CREATE_BLOCKING,
                    exclude: None,
                },
            )
            .await?,
        ),
        None => None,
    };

    let resolved = resolve_cost(assignment.as_ref().map(|a| a.derived_cost), input.total_cost)?;
    let status = initial_status(is_admin, assignment.as_ref());

    let new = NewBooking {
        booking_type: BookingType::Room,
        resource_id: assignment.as_ref().map(|a| a.resource.id),
        requested_site: input.site,
        requested_category: input.category,
        requester_id,
        occupant: input.occupant,
        sponsor: input.sponsor,
        range,
        duration_days: None,
        guest_count: None,
        occupant_category: input.occupant_category,
        relation: input.relation,
        total_cost: resolved.amount,
        cost_source: resolved.source,
        status,
        remarks: input.remarks,
    };

    let booking = persist(&mut tx, &new, assignment.as_ref()).await?;
    tx.commit().await?;

    audit_discarded_cost(&booking.booking_code, &resolved);
    announce(state, &booking, assignment.as_ref().map(|a| &a.resource));
    Ok(booking)
}

/// Create an event-service booking for an authenticated requester.
///
/// The range is `[event_date, event_date + duration_days)`. Occupant
/// category and relation default to `Self`.
pub async fn create_service_booking(
    state: &AppState,
    actor: &AuthUser,
    input: CreateServiceBooking,
) -> AppResult<Booking> {
    input.validate()?;
    let occupant_category = input.occupant_category.unwrap_or(OccupantCategory::Oneself);
    let relation = input.relation.unwrap_or(Relation::Oneself);
    validate_relation(occupant_category, relation)?;
    let range = DateRange::from_days(input.event_date, input.duration_days)?;
    validate_supplied(input.total_cost)?;

    let mut tx = state.pool.begin().await?;

    let assignment = assign(
        &mut tx,
        &AssignmentRequest {
            resource_id: input.resource_id,
            kind: BookingType::Service,
            site: input.site.as_deref().map(str::trim),
            category: input.category.as_deref().map(str::trim),
            occupant_category,
            relation,
            range: &range,
            blocking: CREATE_BLOCKING,
            exclude: None,
        },
    )
    .await?;

    if let (Some(guests), Some(capacity)) = (input.guest_count, assignment.resource.capacity) {
        if guests > capacity {
            return Err(CoreError::Validation(format!(
                "Guest count {guests} exceeds the capacity of {} ({capacity})",
                assignment.resource.label
            ))
            .into());
        }
    }

    let resolved = resolve_cost(Some(assignment.derived_cost), input.total_cost)?;
    let status = initial_status(actor.is_admin(), Some(&assignment));

    let new = NewBooking {
        booking_type: BookingType::Service,
        resource_id: Some(assignment.resource.id),
        requested_site: input
            .site
            .unwrap_or_else(|| assignment.resource.site.clone()),
        requested_category: input
            .category
            .unwrap_or_else(|| assignment.resource.category.clone()),
        requester_id: Some(actor.user_id),
        occupant: input.occupant,
        sponsor: input.sponsor,
        range,
        duration_days: Some(input.duration_days),
        guest_count: input.guest_count,
        occupant_category,
        relation,
        total_cost: resolved.amount,
        cost_source: resolved.source,
        status,
        remarks: input.remarks,
    };

    let booking = persist(&mut tx, &new, Some(&assignment)).await?;
    tx.commit().await?;

    audit_discarded_cost(&booking.application_no, &resolved);
    announce(state, &booking, Some(&assignment.resource));
    Ok(booking)
}

/// Non-member bookings must name the member or officer vouching for them.
fn require_sponsor(requester_id: Option<DbId>, sponsor: Option<&SponsorDetails>) -> AppResult<()> {
    if requester_id.is_none() && sponsor.is_none() {
        return Err(CoreError::Validation(
            "Sponsor details are required for non-member bookings".into(),
        )
        .into());
    }
    Ok(())
}

fn initial_status(is_admin: bool, assignment: Option<&Assignment>) -> BookingStatus {
    if is_admin && assignment.is_some() {
        BookingStatus::Confirmed
    } else {
        BookingStatus::Pending
    }
}

/// Insert the booking and, when it is born confirmed, occupy its resource.
async fn persist(
    conn: &mut PgConnection,
    new: &NewBooking,
    assignment: Option<&Assignment>,
) -> AppResult<Booking> {
    let booking = BookingRepo::insert(&mut *conn, new).await?;

    if let (BookingStatus::Confirmed, Some(a)) = (booking.status, assignment) {
        occupy(&mut *conn, booking.id, a.resource.id, &booking.range()).await?;
    }

    tracing::info!(
        booking_id = booking.id,
        booking_code = %booking.booking_code,
        booking_type = %booking.booking_type,
        resource_id = ?booking.resource_id,
        requester_id = ?booking.requester_id,
        status = %booking.status,
        total_cost = booking.total_cost,
        cost_source = %booking.cost_source,
        "Booking created"
    );
    Ok(booking)
}

fn announce(state: &AppState, booking: &Booking, resource: Option<&Resource>) {
    state.notifications.notify_submission(booking);
    if booking.status == BookingStatus::Confirmed {
        state.notifications.notify_confirmation(booking, resource);
    }
}
