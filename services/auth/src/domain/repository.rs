#![allow(async_fn_in_trait)]

use uuid::Uuid;

use crate::domain::types::{Identity, OtpCode, OtpPurpose, Session};
use crate::error::AuthServiceError;

/// Port for identity lookups. The identity store is read-only from the auth
/// core's perspective.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(
        &self,
        email: &str,
        role: &str,
    ) -> Result<Option<Identity>, AuthServiceError>;

    async fn find_by_phone(
        &self,
        phone: &str,
        role: &str,
    ) -> Result<Option<Identity>, AuthServiceError>;
}

/// Repository for one-time code records.
pub trait OtpRepository: Send + Sync {
    /// Append a new code record. Existing records for the same
    /// (user, target, purpose) are left in place and superseded at read time.
    async fn create(&self, code: &OtpCode) -> Result<(), AuthServiceError>;

    /// The single most-recently-created record for (user, target, purpose),
    /// regardless of used/expired state.
    async fn find_latest(
        &self,
        user_id: Uuid,
        target: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpCode>, AuthServiceError>;

    /// Atomically mark a code used (`used_at = now` iff still unset).
    /// Returns `false` when another caller already consumed it.
    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Repository for session records. Revocation is a flag flip; rows are never
/// deleted.
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), AuthServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, AuthServiceError>;

    /// Idempotent: revoking an inactive or nonexistent session is not an error.
    async fn revoke(&self, id: Uuid) -> Result<(), AuthServiceError>;

    async fn revoke_all(&self, user_id: Uuid) -> Result<(), AuthServiceError>;
}

/// Port for code delivery (SMS, email). Implementations must not assume the
/// caller treats failure as fatal — issuance logs and suppresses errors.
pub trait DeliveryChannel: Send + Sync {
    async fn send_code(
        &self,
        target: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), anyhow::Error>;
}
