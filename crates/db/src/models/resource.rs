//! Resource (room or event service) entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use clubstay_core::availability::{DateRange, ResourceProfile};
use clubstay_core::booking::BookingType;
use clubstay_core::pricing::{PriceTable, MAX_RATE};
use clubstay_core::types::{Amount, DbId, Timestamp};

/// A row from the `resources` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub kind: BookingType,
    pub label: String,
    pub category: String,
    pub site: String,
    pub floor: Option<String>,
    pub capacity: Option<i32>,
    pub self_rate: Amount,
    pub guest_rate: Amount,
    pub facilities: Vec<String>,
    pub description: Option<String>,
    pub is_blocked: bool,
    pub is_occupied: bool,
    pub occupied_from: Option<Timestamp>,
    pub occupied_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Resource {
    pub fn price(&self) -> PriceTable {
        PriceTable {
            self_rate: self.self_rate,
            guest_rate: self.guest_rate,
        }
    }

    /// The attributes eligibility checks look at.
    pub fn profile(&self) -> ResourceProfile<'_> {
        ResourceProfile {
            label: &self.label,
            kind: self.kind,
            site: &self.site,
            category: &self.category,
            is_blocked: self.is_blocked,
        }
    }

    /// The cached occupancy range, if the resource is marked occupied.
    pub fn occupied_range(&self) -> Option<DateRange> {
        match (self.is_occupied, self.occupied_from, self.occupied_until) {
            (true, Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        }
    }
}

/// DTO for creating a resource.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateResource {
    pub kind: BookingType,
    #[validate(length(min = 1, max = 120))]
    pub label: String,
    #[validate(length(min = 1, max = 120))]
    pub category: String,
    #[validate(length(min = 1, max = 120))]
    pub site: String,
    pub floor: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(range(min = 0, max = MAX_RATE))]
    pub self_rate: Amount,
    #[validate(range(min = 0, max = MAX_RATE))]
    pub guest_rate: Amount,
    pub facilities: Option<Vec<String>>,
    pub description: Option<String>,
}

/// DTO for updating a resource. All fields optional.
///
/// Occupancy is never written through this DTO; it follows bookings.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateResource {
    #[validate(length(min = 1, max = 120))]
    pub label: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub category: Option<String>,
    pub floor: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(range(min = 0, max = MAX_RATE))]
    pub self_rate: Option<Amount>,
    #[validate(range(min = 0, max = MAX_RATE))]
    pub guest_rate: Option<Amount>,
    pub facilities: Option<Vec<String>>,
    pub description: Option<String>,
}

/// Query parameters for `GET /api/v1/resources`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceListQuery {
    pub kind: Option<BookingType>,
    pub site: Option<String>,
    pub category: Option<String>,
}

/// One resource whose cached occupancy disagrees with its bookings.
#[derive(Debug, Clone, Serialize)]
pub struct OccupancyDrift {
    pub resource_id: DbId,
    pub label: String,
    pub cached: Option<DateRange>,
    pub expected: Option<DateRange>,
}

/// Result of an occupancy reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub checked: i64,
    pub drift: Vec<OccupancyDrift>,
    pub repaired: bool,
}

/// Resources created by a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub rooms: u64,
    pub services: u64,
}
