//! sea-orm entities for the auth service tables.

pub mod otp_codes;
pub mod sessions;
pub mod users;
