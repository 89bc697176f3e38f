//! Bearer token verification.
//!
//! - [`jwt`] -- HS256 access-token generation and validation.
//!
//! Tokens are issued by the club's identity service; this server only
//! verifies them. [`jwt::generate_access_token`] exists for operators and
//! tests that need to mint a token with the shared secret.

pub mod jwt;
