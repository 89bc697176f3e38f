//! Pricing tiers and the cost resolution policy.

use serde::Serialize;

use crate::availability::DateRange;
use crate::booking::{OccupantCategory, Relation};
pub use crate::booking::CostSource;
use crate::error::CoreError;
use crate::types::Amount;

/// Highest per-unit rate a resource may carry.
pub const MAX_RATE: Amount = 100_000_000;

/// Per-unit rates of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceTable {
    pub self_rate: Amount,
    pub guest_rate: Amount,
}

/// Per-night (room) or per-day (service) rate for an occupant.
///
/// Batchmates of a member pay the member rate even when booked as guests.
pub fn rate(price: &PriceTable, category: OccupantCategory, relation: Relation) -> Amount {
    if category == OccupantCategory::Oneself || relation == Relation::Batchmate {
        price.self_rate
    } else {
        price.guest_rate
    }
}

/// Derived cost of a booking: rate times billable days.
///
/// Room nights and service event days are both whole days over the range,
/// rounded up with a minimum of one.
pub fn derive_cost(
    price: &PriceTable,
    category: OccupantCategory,
    relation: Relation,
    range: &DateRange,
) -> Result<Amount, CoreError> {
    rate(price, category, relation)
        .checked_mul(range.nights())
        .ok_or_else(|| CoreError::Validation("Derived cost exceeds the supported amount".into()))
}

/// The cost a booking is persisted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCost {
    pub amount: Amount,
    pub source: CostSource,
    /// Set when the caller supplied a value that disagrees with the derived one.
    pub discarded_supplied: Option<Amount>,
}

/// Reject negative caller-supplied amounts.
pub fn validate_supplied(amount: Option<Amount>) -> Result<(), CoreError> {
    match amount {
        Some(a) if a < 0 => Err(CoreError::Validation(
            "Total cost must not be negative".into(),
        )),
        _ => Ok(()),
    }
}

/// Pick the persisted cost: derived when resource and dates are known,
/// otherwise the supplied value, otherwise zero.
pub fn resolve_cost(
    derived: Option<Amount>,
    supplied: Option<Amount>,
) -> Result<ResolvedCost, CoreError> {
    validate_supplied(supplied)?;
    Ok(match (derived, supplied) {
        (Some(amount), supplied) => ResolvedCost {
            amount,
            source: CostSource::Derived,
            discarded_supplied: supplied.filter(|s| *s != amount),
        },
        (None, Some(amount)) => ResolvedCost {
            amount,
            source: CostSource::Supplied,
            discarded_supplied: None,
        },
        (None, None) => ResolvedCost {
            amount: 0,
            source: CostSource::Unpriced,
            discarded_supplied: None,
        },
    })
}
