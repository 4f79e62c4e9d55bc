use chrono::{Duration, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::domain::repository::SessionRepository;
use crate::domain::types::Session;
use crate::error::{AuthServiceError, SessionInvalidReason};

/// Session tunables, passed in at construction. Default TTL is 8 hours.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub time_zone: Tz,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 8,
            time_zone: chrono_tz::UTC,
        }
    }
}

pub struct CreateSessionInput {
    pub user_id: Uuid,
    pub token: String,
    pub device: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

pub struct CreateSessionUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
    pub config: SessionConfig,
}

impl<S> CreateSessionUseCase<S>
where
    S: SessionRepository,
{
    pub async fn execute(&self, input: CreateSessionInput) -> Result<Session, AuthServiceError> {
        let now_local = Utc::now().with_timezone(&self.config.time_zone);
        let now = now_local.with_timezone(&Utc);
        let expires_at = (now_local + Duration::hours(self.config.ttl_hours)).with_timezone(&Utc);

        // The id alone grants access to the validate route; v4 ids come from
        // the OS RNG and are not guessable.
        let session = Session {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            token: input.token,
            device: input.device,
            ip: input.ip,
            user_agent: input.user_agent,
            is_active: true,
            last_activity_at: now,
            expires_at,
            created_at: now,
        };
        self.sessions.create(&session).await?;
        Ok(session)
    }
}

pub struct ValidateSessionUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> ValidateSessionUseCase<S>
where
    S: SessionRepository,
{
    /// A session is valid iff it is active and not yet expired. Read-only:
    /// `last_activity_at` moves only on revocation, never on validation.
    pub async fn execute(&self, session_id: Uuid) -> Result<Session, AuthServiceError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(AuthServiceError::SessionInvalid(
                SessionInvalidReason::NotFound,
            ))?;

        if !session.is_active {
            return Err(AuthServiceError::SessionInvalid(
                SessionInvalidReason::Inactive,
            ));
        }
        if session.expires_at <= Utc::now() {
            return Err(AuthServiceError::SessionInvalid(
                SessionInvalidReason::Expired,
            ));
        }

        Ok(session)
    }
}

pub struct RevokeSessionUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> RevokeSessionUseCase<S>
where
    S: SessionRepository,
{
    /// Idempotent flag flip; revoking an already-inactive or unknown session
    /// succeeds without complaint.
    pub async fn execute(&self, session_id: Uuid) -> Result<(), AuthServiceError> {
        self.sessions.revoke(session_id).await
    }
}

pub struct RevokeAllSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> RevokeAllSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub async fn execute(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        self.sessions.revoke_all(user_id).await
    }
}
