//! Field-level validation for occupant and sponsor details.
//!
//! The functions return `Result<(), String>` so they can be used both
//! directly and as `validator` custom hooks in the db models.

use std::sync::LazyLock;

use regex::Regex;

/// Ten-digit mobile number, no separators or country code.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Maximum accepted length for free-text name fields.
pub const MAX_NAME_LEN: usize = 120;

/// Upper bound on `guestCount` for a single booking.
pub const MAX_GUEST_COUNT: i32 = 20;

/// Upper bound on `durationDays` for a service booking.
pub const MAX_DURATION_DAYS: i32 = 30;

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(format!("Invalid phone number '{phone}'. Must be 10 digits"))
    }
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(format!("Invalid email address '{email}'"))
    }
}

/// Reject blank or overly long required text.
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!("{field} must be at most {MAX_NAME_LEN} characters"));
    }
    Ok(())
}

pub fn validate_guest_count(count: i32) -> Result<(), String> {
    if (1..=MAX_GUEST_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(format!("Guest count must be between 1 and {MAX_GUEST_COUNT}"))
    }
}

pub fn validate_duration_days(days: i32) -> Result<(), String> {
    if (1..=MAX_DURATION_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(format!("Duration must be between 1 and {MAX_DURATION_DAYS} days"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_digit_phone_accepted() {
        assert!(validate_phone("9876543210").is_ok());
    }

    #[test]
    fn short_or_formatted_phone_rejected() {
        assert!(validate_phone("98765").is_err());
        assert!(validate_phone("+919876543210").is_err());
        assert!(validate_phone("98765-43210").is_err());
    }

    #[test]
    fn email_shape_checked() {
        assert!(validate_email("member@club.org").is_ok());
        assert!(validate_email("member@club").is_err());
        assert!(validate_email("mem ber@club.org").is_err());
    }

    #[test]
    fn blank_required_field_rejected() {
        assert!(validate_required("Name", "   ").is_err());
        assert!(validate_required("Name", "Asha").is_ok());
        assert!(validate_required("Name", &"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn counts_are_bounded() {
        assert!(validate_guest_count(0).is_err());
        assert!(validate_guest_count(2).is_ok());
        assert!(validate_duration_days(0).is_err());
        assert!(validate_duration_days(MAX_DURATION_DAYS + 1).is_err());
        assert!(validate_duration_days(3).is_ok());
    }
}
