//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated requester from a JWT Bearer token.
//! - [`auth::OptionalAuthUser`] -- Same, but a missing header means a non-member.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.

pub mod auth;
pub mod rbac;
