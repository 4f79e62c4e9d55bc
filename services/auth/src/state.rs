use sea_orm::DatabaseConnection;

use crate::infra::db::{DbOtpRepository, DbSessionRepository, DbUserRepository};
use crate::infra::delivery::LogDelivery;
use crate::usecase::otp::OtpConfig;
use crate::usecase::session::SessionConfig;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub otp_config: OtpConfig,
    pub session_config: SessionConfig,
    pub expose_codes: bool,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_repo(&self) -> DbOtpRepository {
        DbOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }

    pub fn sms_channel(&self) -> LogDelivery {
        LogDelivery::sms()
    }

    pub fn email_channel(&self) -> LogDelivery {
        LogDelivery::email()
    }
}
