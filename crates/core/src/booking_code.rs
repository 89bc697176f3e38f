//! Public booking identifiers.
//!
//! Room bookings get a booking code (`SPT` + six timestamp digits + three
//! random alphanumerics); service bookings get an application number
//! (`SPRT` + `YYYYMMDD` + four random digits). Neither is guaranteed unique
//! on its own; the database enforces uniqueness and callers regenerate on a
//! collision.

use rand::Rng;

use crate::booking::BookingType;
use crate::types::Timestamp;

pub const BOOKING_CODE_PREFIX: &str = "SPT";
pub const APPLICATION_NO_PREFIX: &str = "SPRT";

/// Attempts made before giving up on a colliding identifier.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Generate a room booking code such as `SPT482913K7Q`.
pub fn generate_booking_code(now: Timestamp) -> String {
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    let suffix: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(3)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{BOOKING_CODE_PREFIX}{millis:06}{suffix}")
}

/// Generate a service application number such as `SPRT202406010427`.
pub fn generate_application_no(now: Timestamp) -> String {
    let n: u16 = rand::rng().random_range(0..10_000);
    format!("{APPLICATION_NO_PREFIX}{}{n:04}", now.format("%Y%m%d"))
}

/// The identifier appropriate for a booking type.
pub fn generate_for(kind: BookingType, now: Timestamp) -> String {
    match kind {
        BookingType::Room => generate_booking_code(now),
        BookingType::Service => generate_application_no(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn booking_code_shape() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let code = generate_booking_code(now);
        assert_eq!(code.len(), 12);
        assert!(code.starts_with("SPT"));
        assert!(code[3..9].chars().all(|c| c.is_ascii_digit()));
        assert!(code[9..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn application_no_embeds_date() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let no = generate_application_no(now);
        assert_eq!(no.len(), 16);
        assert!(no.starts_with("SPRT20240601"));
        assert!(no[12..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn identifier_follows_booking_type() {
        let now = Utc::now();
        assert!(generate_for(BookingType::Room, now).starts_with("SPT"));
        assert!(generate_for(BookingType::Service, now).starts_with("SPRT"));
    }
}
