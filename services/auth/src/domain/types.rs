use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity record used for authentication decisions.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    /// PHC-format argon2 hash or a legacy plaintext credential
    /// (see `usecase::credential::verify_password`).
    pub password: String,
    pub role: String,
    pub is_active: bool,
}

/// Why a one-time code was issued. Closed set; stored as its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Login,
    PasswordReset,
    Verification,
}

impl OtpPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::Verification => "VERIFICATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOGIN" => Some(Self::Login),
            "PASSWORD_RESET" => Some(Self::PasswordReset),
            "VERIFICATION" => Some(Self::Verification),
            _ => None,
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-time code bound to a (user, target, purpose) triple.
/// Older records for the same triple are superseded by newer ones at read
/// time; nothing mutates a record after `used_at` is set.
#[derive(Debug, Clone)]
pub struct OtpCode {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Phone or email the code was issued against; verification must name the
    /// same target.
    pub target: String,
    pub purpose: OtpPurpose,
    pub code: String,
    pub attempts: i32,
    pub origin_ip: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn is_valid(&self) -> bool {
        self.used_at.is_none() && self.expires_at > Utc::now()
    }
}

/// Server-side session backing a bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub device: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        self.is_active && Utc::now() < self.expires_at
    }
}
