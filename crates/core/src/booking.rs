//! Booking vocabulary and the booking status state machine.
//!
//! Every enum here is stored as lowercase/capitalized TEXT in the database
//! (guarded by `CHECK` constraints) and travels over the wire as the same
//! string, so one macro generates parsing, display and serde for all of them.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The canonical string stored in the database and sent over the wire.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Invalid {} '{other}'. Must be one of: {}",
                        $label,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_text_enum! {
    /// What kind of resource a booking targets.
    BookingType ("booking type") {
        Room = "room",
        Service = "service",
    }
}

define_text_enum! {
    /// Booking lifecycle status.
    BookingStatus ("booking status") {
        Pending = "pending",
        Confirmed = "confirmed",
        Rejected = "rejected",
        Cancelled = "cancelled",
        Completed = "completed",
    }
}

define_text_enum! {
    /// Manually tracked payment flag.
    PaymentStatus ("payment status") {
        Pending = "pending",
        Paid = "paid",
    }
}

define_text_enum! {
    /// Who the stay is for: the requester themself or someone they sponsor.
    OccupantCategory ("occupant category") {
        Oneself = "Self",
        Guest = "Guest",
    }
}

define_text_enum! {
    /// Occupant's relationship to the sponsoring member or officer.
    Relation ("relation") {
        Oneself = "Self",
        Spouse = "Spouse",
        Children = "Children",
        Parents = "Parents",
        Batchmate = "Batchmate",
        Friend = "Friend",
        Relative = "Relative",
        Acquaintance = "Acquaintance",
    }
}

define_text_enum! {
    /// Occupant gender as recorded on the registration form.
    Gender ("gender") {
        Male = "Male",
        Female = "Female",
        Other = "Other",
    }
}

define_text_enum! {
    /// Where a booking's total cost came from.
    CostSource ("cost source") {
        /// Computed from the resource price table and the booking dates.
        Derived = "derived",
        /// Taken from the caller (no resource known, or an explicit override).
        Supplied = "supplied",
        /// No resource and no caller value; awaiting assignment.
        Unpriced = "unpriced",
    }
}

// ---------------------------------------------------------------------------
// Relations allowed per occupant category
// ---------------------------------------------------------------------------

const SELF_RELATIONS: &[Relation] = &[
    Relation::Oneself,
    Relation::Spouse,
    Relation::Children,
    Relation::Parents,
];

const GUEST_RELATIONS: &[Relation] = &[
    Relation::Batchmate,
    Relation::Friend,
    Relation::Relative,
    Relation::Acquaintance,
    Relation::Spouse,
];

impl OccupantCategory {
    /// Relations that may be declared together with this category.
    pub fn allowed_relations(self) -> &'static [Relation] {
        match self {
            OccupantCategory::Oneself => SELF_RELATIONS,
            OccupantCategory::Guest => GUEST_RELATIONS,
        }
    }
}

/// Validate the category/relation combination of a booking request.
pub fn validate_relation(category: OccupantCategory, relation: Relation) -> Result<(), CoreError> {
    if category.allowed_relations().contains(&relation) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Relation '{relation}' is not allowed for occupant category '{category}'"
        )))
    }
}

/// Whether a booking request must name its resource up front.
///
/// Self stays, batchmates and administrator bookings are bound at creation;
/// other guest bookings may defer the choice to an administrator.
pub fn requires_resource_at_creation(
    category: OccupantCategory,
    relation: Relation,
    is_admin: bool,
) -> bool {
    category == OccupantCategory::Oneself || relation == Relation::Batchmate || is_admin
}

// ---------------------------------------------------------------------------
// Blocking status sets
// ---------------------------------------------------------------------------

/// Statuses that hold a slot when a new booking is requested.
pub const CREATE_BLOCKING: &[BookingStatus] = &[BookingStatus::Pending, BookingStatus::Confirmed];

/// Statuses that prevent a resource from being confirmed for another booking.
pub const CONFIRM_BLOCKING: &[BookingStatus] =
    &[BookingStatus::Confirmed, BookingStatus::Completed];

/// Statuses that occupy a resource.
pub const OCCUPYING: &[BookingStatus] = &[BookingStatus::Confirmed, BookingStatus::Completed];

/// Statuses an administrator may request through a status update.
pub const UPDATABLE_TARGETS: &[BookingStatus] = &[
    BookingStatus::Confirmed,
    BookingStatus::Rejected,
    BookingStatus::Cancelled,
    BookingStatus::Completed,
];

/// Render a blocking set as the TEXT values stored in the database.
pub fn status_texts(statuses: &[BookingStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::BookingStatus;

    /// Returns the set of statuses reachable from `from`.
    ///
    /// `completed -> completed` is allowed so that repeated completion
    /// requests are harmless.
    pub fn valid_transitions(from: BookingStatus) -> &'static [BookingStatus] {
        match from {
            BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Rejected],
            BookingStatus::Confirmed => &[BookingStatus::Cancelled, BookingStatus::Completed],
            BookingStatus::Completed => &[BookingStatus::Completed],
            BookingStatus::Rejected | BookingStatus::Cancelled => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: BookingStatus, to: BookingStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!("Invalid transition: {from} -> {to}"))
        }
    }
}

/// Parse the target of a status update, rejecting anything that is not an
/// administrator-settable status.
pub fn parse_update_target(raw: &str) -> Result<BookingStatus, CoreError> {
    let status: BookingStatus = raw.parse()?;
    if UPDATABLE_TARGETS.contains(&status) {
        Ok(status)
    } else {
        Err(CoreError::Validation(format!(
            "Status '{status}' cannot be set explicitly"
        )))
    }
}

/// Human-readable message sent to the occupant when a booking changes status.
pub fn status_message(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "Your booking request has been received and is pending approval.",
        BookingStatus::Confirmed => {
            "Your booking has been confirmed. Please proceed with payment at check-in."
        }
        BookingStatus::Rejected => "Your booking request has been rejected.",
        BookingStatus::Cancelled => "Your booking has been cancelled.",
        BookingStatus::Completed => "Your booking has been marked as completed.",
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;

    #[test]
    fn statuses_round_trip_through_text() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = "archived".parse::<BookingStatus>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("pending, confirmed"));
    }

    #[test]
    fn self_category_serializes_as_capitalized_self() {
        let json = serde_json::to_string(&OccupantCategory::Oneself).unwrap();
        assert_eq!(json, "\"Self\"");
        let relation: Relation = serde_json::from_str("\"Batchmate\"").unwrap();
        assert_eq!(relation, Relation::Batchmate);
    }

    #[test]
    fn deserializing_bad_relation_fails() {
        assert!(serde_json::from_str::<Relation>("\"Cousin\"").is_err());
    }

    #[test]
    fn self_category_accepts_family_relations() {
        for relation in [Relation::Oneself, Relation::Spouse, Relation::Children, Relation::Parents] {
            assert!(validate_relation(OccupantCategory::Oneself, relation).is_ok());
        }
        assert!(validate_relation(OccupantCategory::Oneself, Relation::Friend).is_err());
    }

    #[test]
    fn guest_category_rejects_self_relation() {
        assert!(validate_relation(OccupantCategory::Guest, Relation::Oneself).is_err());
        assert!(validate_relation(OccupantCategory::Guest, Relation::Batchmate).is_ok());
        assert!(validate_relation(OccupantCategory::Guest, Relation::Spouse).is_ok());
    }

    #[test]
    fn resource_required_for_self_batchmate_and_admin() {
        assert!(requires_resource_at_creation(OccupantCategory::Oneself, Relation::Oneself, false));
        assert!(requires_resource_at_creation(OccupantCategory::Guest, Relation::Batchmate, false));
        assert!(requires_resource_at_creation(OccupantCategory::Guest, Relation::Friend, true));
        assert!(!requires_resource_at_creation(OccupantCategory::Guest, Relation::Friend, false));
    }

    #[test]
    fn pending_moves_to_confirmed_or_rejected() {
        assert!(can_transition(BookingStatus::Pending, BookingStatus::Confirmed));
        assert!(can_transition(BookingStatus::Pending, BookingStatus::Rejected));
        assert!(!can_transition(BookingStatus::Pending, BookingStatus::Completed));
        assert!(!can_transition(BookingStatus::Pending, BookingStatus::Cancelled));
    }

    #[test]
    fn confirmed_moves_to_cancelled_or_completed() {
        assert!(can_transition(BookingStatus::Confirmed, BookingStatus::Cancelled));
        assert!(can_transition(BookingStatus::Confirmed, BookingStatus::Completed));
        assert!(!can_transition(BookingStatus::Confirmed, BookingStatus::Rejected));
    }

    #[test]
    fn completed_is_idempotent_and_others_terminal() {
        assert!(can_transition(BookingStatus::Completed, BookingStatus::Completed));
        assert!(valid_transitions(BookingStatus::Rejected).is_empty());
        assert!(valid_transitions(BookingStatus::Cancelled).is_empty());
    }

    #[test]
    fn validate_transition_names_both_states() {
        let err = validate_transition(BookingStatus::Cancelled, BookingStatus::Confirmed).unwrap_err();
        assert!(err.contains("cancelled"));
        assert!(err.contains("confirmed"));
    }

    #[test]
    fn pending_is_not_an_update_target() {
        assert!(parse_update_target("pending").is_err());
        assert!(parse_update_target("bogus").is_err());
        assert_eq!(parse_update_target("cancelled").unwrap(), BookingStatus::Cancelled);
    }

    #[test]
    fn blocking_sets_differ_on_pending() {
        assert!(CREATE_BLOCKING.contains(&BookingStatus::Pending));
        assert!(!CONFIRM_BLOCKING.contains(&BookingStatus::Pending));
        assert!(CONFIRM_BLOCKING.contains(&BookingStatus::Completed));
    }
}
