//! Auth types shared across Keystep services.
//!
//! Provides JWT validation and the `BearerToken` extractor.

pub mod identity;
pub mod token;
