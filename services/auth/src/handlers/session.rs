use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use keystep_auth_types::identity::BearerToken;
use keystep_auth_types::token::validate_bearer_token;

use crate::error::AuthServiceError;
use crate::handlers::Envelope;
use crate::state::AppState;
use crate::usecase::session::{
    RevokeAllSessionsUseCase, RevokeSessionUseCase, ValidateSessionUseCase,
};

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(serialize_with = "keystep_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    #[serde(serialize_with = "keystep_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

// ── GET /auth/session/{session_id} ────────────────────────────────────────────

pub async fn validate_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ValidateSessionUseCase {
        sessions: state.session_repo(),
    };
    let session = usecase.execute(session_id).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope {
            status: 200,
            message: "session valid",
            data: SessionResponse {
                session_id: session.id,
                user_id: session.user_id,
                device: session.device,
                expires_at: session.expires_at,
                created_at: session.created_at,
            },
        }),
    ))
}

// ── DELETE /auth/session/{session_id} ─────────────────────────────────────────

pub async fn revoke_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = RevokeSessionUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /auth/sessions ─────────────────────────────────────────────────────

pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AuthServiceError> {
    let info = validate_bearer_token(&token, &state.jwt_secret)
        .map_err(|_| AuthServiceError::InvalidToken)?;

    let usecase = RevokeAllSessionsUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(info.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
