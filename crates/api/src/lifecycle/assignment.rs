//! Binding a resource to a booking.
//!
//! Shared by booking creation and confirmation. The caller owns the
//! transaction; the resource row stays locked until it commits or rolls back.

use sqlx::PgConnection;
use clubstay_core::availability::{check_eligibility, unavailable, DateRange, ResourceRequest};
use clubstay_core::booking::{BookingStatus, BookingType, OccupantCategory, Relation};
use clubstay_core::error::CoreError;
use clubstay_core::pricing::derive_cost;
use clubstay_core::types::{Amount, DbId};
use clubstay_db::models::resource::Resource;
use clubstay_db::repositories::{BookingRepo, ResourceRepo};

use crate::error::AppResult;

/// What a booking needs from a resource.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentRequest<'a> {
    pub resource_id: DbId,
    pub kind: BookingType,
    /// Requested site; `None` accepts the resource's own.
    pub site: Option<&'a str>,
    /// Requested category; `None` accepts the resource's own.
    pub category: Option<&'a str>,
    pub occupant_category: OccupantCategory,
    pub relation: Relation,
    pub range: &'a DateRange,
    /// Booking statuses that make an overlapping booking a conflict.
    pub blocking: &'a [BookingStatus],
    /// Booking to ignore in the overlap check (the one being confirmed).
    pub exclude: Option<DbId>,
}

/// A locked resource cleared for the requested range.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub resource: Resource,
    pub derived_cost: Amount,
}

/// Lock the resource, check eligibility and availability, and price the stay.
pub async fn assign(
    conn: &mut PgConnection,
    request: &AssignmentRequest<'_>,
) -> AppResult<Assignment> {
    let resource = ResourceRepo::lock_for_update(&mut *conn, request.resource_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Resource",
            id: request.resource_id,
        })?;

    let wanted = ResourceRequest {
        kind: request.kind,
        site: request.site.unwrap_or(&resource.site),
        category: request.category.unwrap_or(&resource.category),
    };
    check_eligibility(&resource.profile(), &wanted)?;

    let conflict = BookingRepo::find_conflict(
        &mut *conn,
        resource.id,
        request.range,
        request.blocking,
        request.exclude,
    )
    .await?;
    if let Some(existing) = conflict {
        tracing::info!(
            resource_id = resource.id,
            conflicting_booking_id = existing,
            "Resource unavailable for requested range"
        );
        return Err(unavailable(resource.kind, &resource.label).into());
    }

    let derived_cost = derive_cost(
        &resource.price(),
        request.occupant_category,
        request.relation,
        request.range,
    )?;

    Ok(Assignment {
        resource,
        derived_cost,
    })
}
