//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the requests that create or change it
//! - Query parameter and report types for listing endpoints

pub mod booking;
pub mod resource;
