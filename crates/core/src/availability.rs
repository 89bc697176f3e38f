//! Availability math: half-open date ranges and resource eligibility.
//!
//! The repository layer runs the overlap test in SQL against the bookings
//! table; the functions here define the same rule for in-memory checks
//! (reconciliation, tests) and the request-level eligibility checks that
//! precede any availability query.

use chrono::Duration;
use serde::Serialize;

use crate::booking::BookingType;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Number of seconds in one billable night.
const SECONDS_PER_DAY: i64 = 86_400;

/// A half-open interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DateRange {
    /// Build a range, rejecting empty or inverted intervals.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        if start >= end {
            return Err(CoreError::Validation(
                "Invalid date range: check-in must be before check-out".into(),
            ));
        }
        Ok(Self { start, end })
    }

    /// A range starting at `start` lasting `days` whole days.
    pub fn from_days(start: Timestamp, days: i32) -> Result<Self, CoreError> {
        if days < 1 {
            return Err(CoreError::Validation(
                "Duration must be at least one day".into(),
            ));
        }
        Self::new(start, start + Duration::days(i64::from(days)))
    }

    /// Two ranges `[a1,a2)` and `[b1,b2)` overlap iff `a1 < b2 && a2 > b1`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Billable nights: partial days round up, minimum one.
    pub fn nights(&self) -> i64 {
        let secs = (self.end - self.start).num_seconds();
        let nights = (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
        nights.max(1)
    }

    pub fn contains(&self, instant: Timestamp) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Return the id of the first range in `existing` that overlaps `requested`,
/// skipping `exclude`.
pub fn first_overlap<I>(existing: I, requested: &DateRange, exclude: Option<DbId>) -> Option<DbId>
where
    I: IntoIterator<Item = (DbId, DateRange)>,
{
    existing
        .into_iter()
        .filter(|(id, _)| Some(*id) != exclude)
        .find(|(_, range)| range.overlaps(requested))
        .map(|(id, _)| id)
}

/// The occupancy a resource should record given the ranges of the bookings
/// that currently hold it.
///
/// A cached range that still belongs to a holder is kept; otherwise the
/// earliest holder wins. No holders means the resource is free.
pub fn expected_occupancy(cached: Option<DateRange>, holders: &[DateRange]) -> Option<DateRange> {
    if let Some(current) = cached {
        if holders.contains(&current) {
            return Some(current);
        }
    }
    holders.iter().min_by_key(|r| (r.start, r.end)).copied()
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// The resource attributes that decide whether it may serve a request.
#[derive(Debug, Clone, Copy)]
pub struct ResourceProfile<'a> {
    pub label: &'a str,
    pub kind: BookingType,
    pub site: &'a str,
    pub category: &'a str,
    pub is_blocked: bool,
}

/// What the booking asked for.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRequest<'a> {
    pub kind: BookingType,
    pub site: &'a str,
    pub category: &'a str,
}

/// Check that a resource can serve a request at all, before looking at dates.
///
/// Blocked resources are never bookable; kind, site and category must match
/// what the booking requested.
pub fn check_eligibility(
    resource: &ResourceProfile<'_>,
    request: &ResourceRequest<'_>,
) -> Result<(), CoreError> {
    if resource.is_blocked {
        return Err(CoreError::Conflict(format!(
            "{} {} is currently unavailable",
            kind_label(resource.kind),
            resource.label
        )));
    }
    if resource.kind != request.kind {
        return Err(CoreError::Conflict(format!(
            "{} {} cannot be used for a {} booking",
            kind_label(resource.kind),
            resource.label,
            request.kind
        )));
    }
    if resource.site != request.site || resource.category != request.category {
        return Err(CoreError::Conflict(format!(
            "{} {} does not match the requested site or category",
            kind_label(resource.kind),
            resource.label
        )));
    }
    Ok(())
}

/// Conflict error for a resource that is taken for the requested dates.
pub fn unavailable(kind: BookingType, label: &str) -> CoreError {
    CoreError::Conflict(format!(
        "{} {label} is already booked for the selected dates",
        kind_label(kind)
    ))
}

fn kind_label(kind: BookingType) -> &'static str {
    match kind {
        BookingType::Room => "Room",
        BookingType::Service => "Service",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap()
    }

    fn range(a: u32, b: u32) -> DateRange {
        DateRange::new(day(a), day(b)).unwrap()
    }

    #[test]
    fn inverted_and_empty_ranges_rejected() {
        assert!(DateRange::new(day(3), day(1)).is_err());
        assert!(DateRange::new(day(3), day(3)).is_err());
    }

    #[test]
    fn overlapping_ranges_detected() {
        assert!(range(1, 3).overlaps(&range(2, 4)));
        assert!(range(2, 4).overlaps(&range(1, 3)));
        assert!(range(1, 5).overlaps(&range(2, 3)));
    }

    #[test]
    fn back_to_back_ranges_do_not_overlap() {
        assert!(!range(1, 3).overlaps(&range(3, 5)));
        assert!(!range(3, 5).overlaps(&range(1, 3)));
    }

    #[test]
    fn nights_round_up_with_minimum_one() {
        assert_eq!(range(1, 3).nights(), 2);
        let same_day = DateRange::new(day(1), day(1) + Duration::hours(5)).unwrap();
        assert_eq!(same_day.nights(), 1);
        let partial = DateRange::new(day(1), day(2) + Duration::hours(1)).unwrap();
        assert_eq!(partial.nights(), 2);
    }

    #[test]
    fn from_days_requires_positive_duration() {
        assert!(DateRange::from_days(day(1), 0).is_err());
        assert_eq!(DateRange::from_days(day(1), 2).unwrap(), range(1, 3));
    }

    #[test]
    fn first_overlap_skips_excluded_booking() {
        let existing = vec![(7, range(1, 3)), (8, range(5, 6))];
        assert_eq!(first_overlap(existing.clone(), &range(2, 4), None), Some(7));
        assert_eq!(first_overlap(existing.clone(), &range(2, 4), Some(7)), None);
        assert_eq!(first_overlap(existing, &range(3, 5), None), None);
    }

    #[test]
    fn expected_occupancy_keeps_valid_cache() {
        let holders = [range(1, 3), range(5, 7)];
        assert_eq!(expected_occupancy(Some(range(5, 7)), &holders), Some(range(5, 7)));
    }

    #[test]
    fn expected_occupancy_falls_back_to_earliest_holder() {
        let holders = [range(5, 7), range(1, 3)];
        assert_eq!(expected_occupancy(Some(range(9, 10)), &holders), Some(range(1, 3)));
        assert_eq!(expected_occupancy(None, &holders), Some(range(1, 3)));
    }

    #[test]
    fn expected_occupancy_clears_without_holders() {
        assert_eq!(expected_occupancy(Some(range(1, 3)), &[]), None);
    }

    fn profile(blocked: bool) -> ResourceProfile<'static> {
        ResourceProfile {
            label: "201",
            kind: BookingType::Room,
            site: "SPORTI-1",
            category: "VIP",
            is_blocked: blocked,
        }
    }

    #[test]
    fn blocked_resource_is_ineligible() {
        let request = ResourceRequest { kind: BookingType::Room, site: "SPORTI-1", category: "VIP" };
        let err = check_eligibility(&profile(true), &request).unwrap_err();
        assert!(err.to_string().contains("Room 201 is currently unavailable"));
    }

    #[test]
    fn mismatched_site_or_category_is_ineligible() {
        let wrong_site = ResourceRequest { kind: BookingType::Room, site: "SPORTI-2", category: "VIP" };
        assert!(check_eligibility(&profile(false), &wrong_site).is_err());
        let wrong_category =
            ResourceRequest { kind: BookingType::Room, site: "SPORTI-1", category: "Standard" };
        assert!(check_eligibility(&profile(false), &wrong_category).is_err());
        let wrong_kind =
            ResourceRequest { kind: BookingType::Service, site: "SPORTI-1", category: "VIP" };
        assert!(check_eligibility(&profile(false), &wrong_kind).is_err());
    }

    #[test]
    fn matching_request_is_eligible() {
        let request = ResourceRequest { kind: BookingType::Room, site: "SPORTI-1", category: "VIP" };
        assert!(check_eligibility(&profile(false), &request).is_ok());
    }
}
