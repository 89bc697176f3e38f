//! Booking entity model, request DTOs and listing/statistics types.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};
use clubstay_core::availability::DateRange;
use clubstay_core::booking::{
    BookingStatus, BookingType, CostSource, Gender, OccupantCategory, PaymentStatus, Relation,
};
use clubstay_core::error::CoreError;
use clubstay_core::dates::{deserialize_optional_timestamp, deserialize_timestamp};
use clubstay_core::types::{Amount, DbId, Timestamp};
use clubstay_core::validation;

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub booking_code: String,
    pub application_no: String,
    #[sqlx(try_from = "String")]
    pub booking_type: BookingType,
    pub resource_id: Option<DbId>,
    pub requested_site: String,
    pub requested_category: String,
    pub requester_id: Option<DbId>,
    pub occupant_name: String,
    pub occupant_phone: String,
    #[sqlx(try_from = "String")]
    pub occupant_gender: Gender,
    pub occupant_location: String,
    pub occupant_email: Option<String>,
    pub sponsor_name: Option<String>,
    pub sponsor_phone: Option<String>,
    pub sponsor_designation: Option<String>,
    #[sqlx(try_from = "NullableGender")]
    pub sponsor_gender: Option<Gender>,
    pub sponsor_email: Option<String>,
    pub check_in: Timestamp,
    pub check_out: Timestamp,
    pub duration_days: Option<i32>,
    pub guest_count: Option<i32>,
    #[sqlx(try_from = "String")]
    pub occupant_category: OccupantCategory,
    #[sqlx(try_from = "String")]
    pub relation: Relation,
    pub total_cost: Amount,
    #[sqlx(try_from = "String")]
    pub cost_source: CostSource,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub remarks: Option<String>,
    pub checked_in_at: Option<Timestamp>,
    pub checked_out_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Nullable gender column, decoded into `Option<Gender>`.
#[derive(sqlx::Type)]
#[sqlx(transparent)]
pub struct NullableGender(Option<String>);

impl TryFrom<NullableGender> for Option<Gender> {
    type Error = CoreError;

    fn try_from(value: NullableGender) -> Result<Self, Self::Error> {
        value.0.map(|raw| raw.parse()).transpose()
    }
}

impl Booking {
    /// The stored `[check_in, check_out)` range.
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.check_in,
            end: self.check_out,
        }
    }

    /// Whether this booking currently holds its resource: confirmed, or
    /// checked in and not yet checked out.
    pub fn holds_resource(&self) -> bool {
        match self.status {
            BookingStatus::Confirmed => true,
            BookingStatus::Completed => self.checked_out_at.is_none(),
            _ => false,
        }
    }

    /// Address notifications go to: the occupant's, else the sponsor's.
    pub fn contact_email(&self) -> Option<&str> {
        self.occupant_email
            .as_deref()
            .or(self.sponsor_email.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Validation hooks
// ---------------------------------------------------------------------------

fn check_phone(value: &str) -> Result<(), ValidationError> {
    validation::validate_phone(value).map_err(|msg| {
        ValidationError::new("phone").with_message(msg.into())
    })
}

fn check_email(value: &str) -> Result<(), ValidationError> {
    validation::validate_email(value).map_err(|msg| {
        ValidationError::new("email").with_message(msg.into())
    })
}

fn check_not_blank(value: &str) -> Result<(), ValidationError> {
    validation::validate_required("Field", value).map_err(|msg| {
        ValidationError::new("required").with_message(msg.into())
    })
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// The person who will stay in the room or attend the event.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OccupantDetails {
    #[validate(custom(function = "check_not_blank"))]
    pub name: String,
    #[validate(custom(function = "check_phone"))]
    pub phone: String,
    pub gender: Gender,
    #[validate(custom(function = "check_not_blank"))]
    pub location: String,
    #[validate(custom(function = "check_email"))]
    pub email: Option<String>,
}

/// The member or officer vouching for a non-member booking.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SponsorDetails {
    #[validate(custom(function = "check_not_blank"))]
    pub name: String,
    #[validate(custom(function = "check_phone"))]
    pub phone: String,
    #[validate(custom(function = "check_not_blank"))]
    pub designation: String,
    pub gender: Option<Gender>,
    #[validate(custom(function = "check_email"))]
    pub email: Option<String>,
}

/// DTO for `POST /api/v1/bookings/room`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoomBooking {
    pub resource_id: Option<DbId>,
    #[validate(custom(function = "check_not_blank"))]
    pub site: String,
    #[validate(custom(function = "check_not_blank"))]
    pub category: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub check_in: Timestamp,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub check_out: Timestamp,
    pub occupant_category: OccupantCategory,
    pub relation: Relation,
    #[validate(nested)]
    pub occupant: OccupantDetails,
    #[validate(nested)]
    pub sponsor: Option<SponsorDetails>,
    pub total_cost: Option<Amount>,
    pub remarks: Option<String>,
}

/// DTO for `POST /api/v1/bookings/service`.
///
/// Site and category default to the service's own when omitted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateServiceBooking {
    pub resource_id: DbId,
    pub site: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub event_date: Timestamp,
    #[validate(range(min = 1, max = 30))]
    pub duration_days: i32,
    #[validate(range(min = 1, max = 20))]
    pub guest_count: Option<i32>,
    pub occupant_category: Option<OccupantCategory>,
    pub relation: Option<Relation>,
    #[validate(nested)]
    pub occupant: OccupantDetails,
    #[validate(nested)]
    pub sponsor: Option<SponsorDetails>,
    pub total_cost: Option<Amount>,
    pub remarks: Option<String>,
}

/// Fully resolved values for a booking insert.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_type: BookingType,
    pub resource_id: Option<DbId>,
    pub requested_site: String,
    pub requested_category: String,
    pub requester_id: Option<DbId>,
    pub occupant: OccupantDetails,
    pub sponsor: Option<SponsorDetails>,
    pub range: DateRange,
    pub duration_days: Option<i32>,
    pub guest_count: Option<i32>,
    pub occupant_category: OccupantCategory,
    pub relation: Relation,
    pub total_cost: Amount,
    pub cost_source: CostSource,
    pub status: BookingStatus,
    pub remarks: Option<String>,
}

/// DTO for `PUT /api/v1/bookings/{id}/status`.
///
/// `status` stays a string so an unknown value surfaces as a validation
/// error rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingStatus {
    pub status: String,
    pub resource_id: Option<DbId>,
    pub total_cost: Option<Amount>,
    pub remarks: Option<String>,
}

/// DTO for `PUT /api/v1/bookings/{id}/payment`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentStatus {
    pub payment_status: String,
}

/// Fields written by a status transition.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: BookingStatus,
    pub resource_id: Option<DbId>,
    pub total_cost: Amount,
    pub cost_source: CostSource,
    pub remarks: Option<String>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Columns `GET /bookings` may sort by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSort {
    #[default]
    CreatedAt,
    CheckIn,
    CheckOut,
    TotalCost,
}

impl BookingSort {
    pub fn column(self) -> &'static str {
        match self {
            BookingSort::CreatedAt => "created_at",
            BookingSort::CheckIn => "check_in",
            BookingSort::CheckOut => "check_out",
            BookingSort::TotalCost => "total_cost",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filters shared by listing and statistics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub booking_type: Option<BookingType>,
    pub site: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub occupant_category: Option<OccupantCategory>,
    /// `true`: requester present; `false`: non-member bookings.
    pub is_member: Option<bool>,
    pub booking_code: Option<String>,
    /// Window on when the booking was made, not on the stay.
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub start_date: Option<Timestamp>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub end_date: Option<Timestamp>,
}

/// Query parameters for `GET /api/v1/bookings`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub booking_type: Option<BookingType>,
    pub site: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub occupant_category: Option<OccupantCategory>,
    pub is_member: Option<bool>,
    pub booking_code: Option<String>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 10, capped at 100.
    pub limit: Option<i64>,
    pub sort: Option<BookingSort>,
    pub order: Option<SortOrder>,
}

impl BookingListQuery {
    pub fn filter(&self) -> BookingFilter {
        BookingFilter {
            status: self.status,
            booking_type: self.booking_type,
            site: self.site.clone(),
            payment_status: self.payment_status,
            occupant_category: self.occupant_category,
            is_member: self.is_member,
            booking_code: self.booking_code.clone(),
            start_date: None,
            end_date: None,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Count and revenue for one group key (status, site, ...).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub count: i64,
    pub revenue: i64,
}

/// Count and revenue for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonthlyTotal {
    pub month: String,
    pub count: i64,
    pub revenue: i64,
}

/// Response body for `GET /api/v1/bookings/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct BookingStats {
    pub total_bookings: i64,
    /// Sum of `total_cost` over paid bookings.
    pub paid_revenue: i64,
    pub average_booking_value: f64,
    pub by_status: Vec<GroupTotal>,
    pub by_type: Vec<GroupTotal>,
    pub by_site: Vec<GroupTotal>,
    pub by_category: Vec<GroupTotal>,
    pub by_payment_status: Vec<GroupTotal>,
    pub monthly: Vec<MonthlyTotal>,
}

/// Response body for `GET /api/v1/bookings/cancellations`.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationReport {
    pub total_cancelled: i64,
    pub lost_revenue: i64,
    pub monthly: Vec<MonthlyTotal>,
    pub recent: Vec<Booking>,
}
