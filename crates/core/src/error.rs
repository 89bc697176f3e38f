use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The entity exists but is not in a state that allows the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A booking write and its paired resource-occupancy write diverged.
    /// Requires operator reconciliation.
    #[error("Consistency breach on booking {booking_id} (resource {resource_id:?}): {message}")]
    Consistency {
        booking_id: DbId,
        resource_id: Option<DbId>,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
