//! Booking lifecycle orchestration.
//!
//! Every operation that touches a resource runs in one transaction that
//! locks the booking row (for transitions) and then the resource row, writes
//! the booking and the occupancy cache, and commits both together.
//! Notifications are dispatched only after the commit succeeds.

pub mod assignment;
pub mod creation;
pub mod stay;
pub mod transition;

use sqlx::PgConnection;
use clubstay_core::availability::DateRange;
use clubstay_core::error::CoreError;
use clubstay_core::pricing::ResolvedCost;
use clubstay_core::types::DbId;
use clubstay_db::repositories::ResourceRepo;

use crate::error::AppResult;

pub use creation::{create_room_booking, create_service_booking};
pub use stay::{check_in, check_out, reconcile_occupancy};
pub use transition::{update_payment, update_status};

/// Record `range` as the resource's current occupancy.
///
/// The resource must already be locked by the caller.
async fn occupy(
    conn: &mut PgConnection,
    booking_id: DbId,
    resource_id: DbId,
    range: &DateRange,
) -> AppResult<()> {
    let updated = ResourceRepo::set_occupancy(conn, resource_id, Some(range)).await?;
    if !updated {
        return Err(CoreError::Consistency {
            booking_id,
            resource_id: Some(resource_id),
            message: "resource row vanished while locked".into(),
        }
        .into());
    }
    Ok(())
}

/// Log a caller-supplied cost that lost to the derived one.
fn audit_discarded_cost(booking: &str, resolved: &ResolvedCost) {
    if let Some(supplied) = resolved.discarded_supplied {
        tracing::warn!(
            booking,
            supplied,
            derived = resolved.amount,
            "Supplied total cost differs from derived cost; derived cost kept"
        );
    }
}
