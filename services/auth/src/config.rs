use chrono_tz::Tz;

use crate::usecase::otp::OtpConfig;
use crate::usecase::session::SessionConfig;

/// Auth service configuration loaded from environment variables.
///
/// TTLs, the reference time zone, and the code policy are carried in the
/// explicit `OtpConfig`/`SessionConfig` structs handed to each use case —
/// nothing reads ambient state after startup.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// HMAC secret for signing bearer tokens. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3110). Env var: `AUTH_PORT`.
    pub auth_port: u16,
    /// Code TTL / width / zone. Env vars: `OTP_TTL_MINUTES`, `OTP_CODE_LENGTH`,
    /// `AUTH_TIME_ZONE`.
    pub otp: OtpConfig,
    /// Session TTL / zone. Env var: `SESSION_TTL_HOURS`.
    pub session: SessionConfig,
    /// Include generated codes in issuance responses. Development only;
    /// `APP_ENV=development` opts in, everything else stays dark.
    pub expose_codes: bool,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let time_zone: Tz = std::env::var("AUTH_TIME_ZONE")
            .ok()
            .map(|v| v.parse().expect("invalid AUTH_TIME_ZONE"))
            .unwrap_or(chrono_tz::UTC);

        // Four digits is the floor; production deployments should stay at six.
        let code_length = std::env::var("OTP_CODE_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(6)
            .max(4);

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            auth_port: std::env::var("AUTH_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3110),
            otp: OtpConfig {
                ttl_minutes: std::env::var("OTP_TTL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
                code_length,
                time_zone,
            },
            session: SessionConfig {
                ttl_hours: std::env::var("SESSION_TTL_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(8),
                time_zone,
            },
            expose_codes: std::env::var("APP_ENV")
                .map(|v| v == "development")
                .unwrap_or(false),
        }
    }
}
