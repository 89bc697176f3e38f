//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! take `&PgPool`; anything that participates in a booking transaction takes
//! `&mut PgConnection` so the caller controls the transaction boundary.

pub mod booking_repo;
pub mod resource_repo;

pub use booking_repo::BookingRepo;
pub use resource_repo::ResourceRepo;
