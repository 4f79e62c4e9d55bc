use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Why a session failed validation. Surfaced to the caller as a `reason`
/// field so clients can distinguish a stale session from a revoked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInvalidReason {
    NotFound,
    Inactive,
    Expired,
}

impl SessionInvalidReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
        }
    }
}

/// Auth service domain error variants.
///
/// Credential failures are deliberately undifferentiated (absent, inactive,
/// and wrong-password all map to `InvalidCredentials`) to avoid leaking
/// account existence. OTP failures stay distinct because the verification UX
/// needs specific feedback.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("validation failed")]
    Validation(Vec<String>),
    #[error("invalid user credentials")]
    InvalidCredentials,
    #[error("mobile number required for verification")]
    MobileRequired,
    #[error("verification code not found")]
    OtpNotFound,
    #[error("verification code already used")]
    OtpUsed,
    #[error("verification code expired")]
    OtpExpired,
    #[error("verification code mismatch")]
    OtpMismatch,
    #[error("invalid token")]
    InvalidToken,
    #[error("session {}", .0.as_str())]
    SessionInvalid(SessionInvalidReason),
    #[error("unknown login step: {0}")]
    UnknownStep(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MobileRequired => "MOBILE_REQUIRED",
            Self::OtpNotFound => "OTP_NOT_FOUND",
            Self::OtpUsed => "OTP_USED",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpMismatch => "OTP_MISMATCH",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::SessionInvalid(_) => "SESSION_INVALID",
            Self::UnknownStep(_) => "UNKNOWN_STEP",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MobileRequired | Self::UnknownStep(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials
            | Self::OtpNotFound
            | Self::OtpUsed
            | Self::OtpExpired
            | Self::OtpMismatch
            | Self::InvalidToken
            | Self::SessionInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let mut body = serde_json::json!({
            "status": status.as_u16(),
            "message": self.to_string(),
        });
        match &self {
            Self::Validation(errors) => {
                body["errors"] = serde_json::json!(errors);
            }
            Self::SessionInvalid(reason) => {
                body["reason"] = serde_json::json!(reason.as_str());
            }
            Self::Internal(e) => {
                // Fault detail is only surfaced in development builds.
                if cfg!(debug_assertions) {
                    body["error"] = serde_json::json!(format!("{e:#}"));
                }
            }
            _ => {}
        }
        (status, axum::Json(body)).into_response()
    }
}
