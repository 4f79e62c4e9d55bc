use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthServiceError;
use crate::handlers::{Envelope, client_ip, user_agent};
use crate::state::AppState;
use crate::usecase::credential::VerifyCredentialsUseCase;
use crate::usecase::login::{
    CredentialValidationInput, CredentialValidationUseCase, FinalLoginInput, FinalLoginUseCase,
    LoginStep, SendOtpInput, SendOtpUseCase,
};
use crate::usecase::otp::{IssueOtpUseCase, VerifyOtpUseCase};
use crate::usecase::session::CreateSessionUseCase;

// ── Request bodies ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CredentialValidationRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub mobile: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct FinalLoginRequest {
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub role: Option<String>,
    pub code: Option<String>,
    pub device: Option<String>,
}

/// Legacy single-endpoint body: a `step` discriminator plus the union of the
/// three structured bodies.
#[derive(Deserialize)]
pub struct LegacyLoginRequest {
    pub step: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub mobile: Option<String>,
    pub role: Option<String>,
    pub code: Option<String>,
    pub device: Option<String>,
}

// ── Response bodies ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct OtpIssuedResponse {
    pub user_id: Uuid,
    #[serde(serialize_with = "keystep_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    /// Present only when the service runs with `APP_ENV=development`;
    /// production responses never disclose the code in-band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Serialize)]
pub struct FinalLoginResponse {
    pub token: String,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    #[serde(serialize_with = "keystep_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

// ── Field-presence validation (before any lookup) ─────────────────────────────

fn required(
    value: Option<String>,
    field: &'static str,
    errors: &mut Vec<String>,
) -> Option<String> {
    match value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
        Some(v) => Some(v),
        None => {
            errors.push(format!("{field} is required"));
            None
        }
    }
}

// ── Step runners (shared by structured endpoints and the legacy dispatcher) ───

async fn run_credential_validation(
    state: &AppState,
    body: CredentialValidationRequest,
    origin_ip: Option<String>,
) -> Result<Envelope<OtpIssuedResponse>, AuthServiceError> {
    let mut errors = Vec::new();
    let email = required(body.email, "email", &mut errors);
    let password = required(body.password, "password", &mut errors);
    let role = required(body.role, "role", &mut errors);
    let (email, password, role) = match (email, password, role) {
        (Some(e), Some(p), Some(r)) if errors.is_empty() => (e, p, r),
        _ => return Err(AuthServiceError::Validation(errors)),
    };

    let usecase = CredentialValidationUseCase {
        credentials: VerifyCredentialsUseCase {
            users: state.user_repo(),
        },
        otp: IssueOtpUseCase {
            otp_codes: state.otp_repo(),
            sms: state.sms_channel(),
            email: state.email_channel(),
            config: state.otp_config.clone(),
        },
    };
    let out = usecase
        .execute(CredentialValidationInput {
            email,
            password,
            role,
            origin_ip,
        })
        .await?;

    Ok(Envelope {
        status: 200,
        message: "verification code sent",
        data: OtpIssuedResponse {
            user_id: out.user_id,
            expires_at: out.expires_at,
            code: state.expose_codes.then_some(out.code),
        },
    })
}

async fn run_send_otp(
    state: &AppState,
    body: SendOtpRequest,
    origin_ip: Option<String>,
) -> Result<Envelope<OtpIssuedResponse>, AuthServiceError> {
    let mut errors = Vec::new();
    let mobile = required(body.mobile, "mobile", &mut errors);
    let role = required(body.role, "role", &mut errors);
    let (mobile, role) = match (mobile, role) {
        (Some(m), Some(r)) if errors.is_empty() => (m, r),
        _ => return Err(AuthServiceError::Validation(errors)),
    };

    let usecase = SendOtpUseCase {
        users: state.user_repo(),
        otp: IssueOtpUseCase {
            otp_codes: state.otp_repo(),
            sms: state.sms_channel(),
            email: state.email_channel(),
            config: state.otp_config.clone(),
        },
    };
    let out = usecase
        .execute(SendOtpInput {
            mobile,
            role,
            origin_ip,
        })
        .await?;

    Ok(Envelope {
        status: 200,
        message: "verification code sent",
        data: OtpIssuedResponse {
            user_id: out.user_id,
            expires_at: out.expires_at,
            code: state.expose_codes.then_some(out.code),
        },
    })
}

async fn run_final_login(
    state: &AppState,
    body: FinalLoginRequest,
    ip: Option<String>,
    user_agent: Option<String>,
) -> Result<Envelope<FinalLoginResponse>, AuthServiceError> {
    let mut errors = Vec::new();
    let role = required(body.role, "role", &mut errors);
    let code = required(body.code, "code", &mut errors);
    // Email and mobile are each optional, but one of them must identify the user.
    let email = body.email.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
    let mobile = body.mobile.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
    if email.is_none() && mobile.is_none() {
        errors.push("email or mobile is required".to_owned());
    }
    let (role, code) = match (role, code) {
        (Some(r), Some(c)) if errors.is_empty() => (r, c),
        _ => return Err(AuthServiceError::Validation(errors)),
    };

    let usecase = FinalLoginUseCase {
        users: state.user_repo(),
        otp: VerifyOtpUseCase {
            otp_codes: state.otp_repo(),
        },
        sessions: CreateSessionUseCase {
            sessions: state.session_repo(),
            config: state.session_config.clone(),
        },
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(FinalLoginInput {
            email,
            mobile,
            role,
            code,
            device: body.device,
            ip,
            user_agent,
        })
        .await?;

    Ok(Envelope {
        status: 200,
        message: "login successful",
        data: FinalLoginResponse {
            token: out.token,
            session_id: out.session.id,
            user_id: out.user.id,
            email: out.user.email,
            role: out.user.role,
            expires_at: out.session.expires_at,
        },
    })
}

// ── POST /auth/login/credentials ──────────────────────────────────────────────

pub async fn credential_validation(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CredentialValidationRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let ip = client_ip(&headers, &addr);
    let envelope = run_credential_validation(&state, body, ip).await?;
    Ok((StatusCode::OK, Json(envelope)))
}

// ── POST /auth/login/otp ──────────────────────────────────────────────────────

pub async fn send_otp(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let ip = client_ip(&headers, &addr);
    let envelope = run_send_otp(&state, body, ip).await?;
    Ok((StatusCode::OK, Json(envelope)))
}

// ── POST /auth/login/verify ───────────────────────────────────────────────────

pub async fn final_login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<FinalLoginRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let ip = client_ip(&headers, &addr);
    let ua = user_agent(&headers);
    let envelope = run_final_login(&state, body, ip, ua).await?;
    Ok((StatusCode::OK, Json(envelope)))
}

// ── POST /auth/login (legacy step dispatcher) ─────────────────────────────────

pub async fn legacy_login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<LegacyLoginRequest>,
) -> Result<Response, AuthServiceError> {
    let step = body
        .step
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AuthServiceError::Validation(vec!["step is required".to_owned()]))?;

    let ip = client_ip(&headers, &addr);
    match LoginStep::parse(step)? {
        LoginStep::CredentialValidation => {
            let envelope = run_credential_validation(
                &state,
                CredentialValidationRequest {
                    email: body.email,
                    password: body.password,
                    role: body.role,
                },
                ip,
            )
            .await?;
            Ok((StatusCode::OK, Json(envelope)).into_response())
        }
        LoginStep::SendOtp => {
            let envelope = run_send_otp(
                &state,
                SendOtpRequest {
                    mobile: body.mobile,
                    role: body.role,
                },
                ip,
            )
            .await?;
            Ok((StatusCode::OK, Json(envelope)).into_response())
        }
        LoginStep::FinalLogin => {
            let ua = user_agent(&headers);
            let envelope = run_final_login(
                &state,
                FinalLoginRequest {
                    email: body.email,
                    mobile: body.mobile,
                    role: body.role,
                    code: body.code,
                    device: body.device,
                },
                ip,
                ua,
            )
            .await?;
            Ok((StatusCode::OK, Json(envelope)).into_response())
        }
    }
}
