//! Service plumbing shared across Keystep services.
//!
//! Health endpoints, tracing init, request-id middleware, and serde helpers.
//! No business logic lives here.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
