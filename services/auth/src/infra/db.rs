use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use keystep_auth_schema::{otp_codes, sessions, users};

use crate::domain::repository::{OtpRepository, SessionRepository, UserRepository};
use crate::domain::types::{Identity, OtpCode, OtpPurpose, Session};
use crate::error::AuthServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(
        &self,
        email: &str,
        role: &str,
    ) -> Result<Option<Identity>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::Role.eq(role))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(identity_from_model))
    }

    async fn find_by_phone(
        &self,
        phone: &str,
        role: &str,
    ) -> Result<Option<Identity>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .filter(users::Column::Role.eq(role))
            .one(&self.db)
            .await
            .context("find user by phone")?;
        Ok(model.map(identity_from_model))
    }
}

fn identity_from_model(model: users::Model) -> Identity {
    Identity {
        id: model.id,
        email: model.email,
        phone: model.phone,
        password: model.password,
        role: model.role,
        is_active: model.is_active,
    }
}

// ── OTP repository ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpRepository {
    pub db: DatabaseConnection,
}

impl OtpRepository for DbOtpRepository {
    async fn create(&self, code: &OtpCode) -> Result<(), AuthServiceError> {
        otp_codes::ActiveModel {
            id: Set(code.id),
            user_id: Set(code.user_id),
            target: Set(code.target.clone()),
            purpose: Set(code.purpose.as_str().to_owned()),
            code: Set(code.code.clone()),
            attempts: Set(code.attempts),
            origin_ip: Set(code.origin_ip.clone()),
            expires_at: Set(code.expires_at),
            used_at: Set(None),
            created_at: Set(code.created_at),
        }
        .insert(&self.db)
        .await
        .context("create otp code")?;
        Ok(())
    }

    async fn find_latest(
        &self,
        user_id: Uuid,
        target: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpCode>, AuthServiceError> {
        // Newest record wins; superseded ones stay behind it untouched.
        let model = otp_codes::Entity::find()
            .filter(otp_codes::Column::UserId.eq(user_id))
            .filter(otp_codes::Column::Target.eq(target))
            .filter(otp_codes::Column::Purpose.eq(purpose.as_str()))
            .order_by_desc(otp_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest otp code")?;
        model.map(otp_from_model).transpose()
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        // Compare-and-set: only one of two racing logins can flip used_at.
        let result = otp_codes::Entity::update_many()
            .col_expr(otp_codes::Column::UsedAt, Expr::value(Utc::now()))
            .filter(otp_codes::Column::Id.eq(id))
            .filter(otp_codes::Column::UsedAt.is_null())
            .exec(&self.db)
            .await
            .context("consume otp code")?;
        Ok(result.rows_affected > 0)
    }
}

fn otp_from_model(model: otp_codes::Model) -> Result<OtpCode, AuthServiceError> {
    let purpose = OtpPurpose::parse(&model.purpose)
        .ok_or_else(|| anyhow::anyhow!("unknown otp purpose in store: {}", model.purpose))?;
    Ok(OtpCode {
        id: model.id,
        user_id: model.user_id,
        target: model.target,
        purpose,
        code: model.code,
        attempts: model.attempts,
        origin_ip: model.origin_ip,
        expires_at: model.expires_at,
        used_at: model.used_at,
        created_at: model.created_at,
    })
}

// ── Session repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), AuthServiceError> {
        sessions::ActiveModel {
            id: Set(session.id),
            user_id: Set(session.user_id),
            token: Set(session.token.clone()),
            device: Set(session.device.clone()),
            ip: Set(session.ip.clone()),
            user_agent: Set(session.user_agent.clone()),
            is_active: Set(session.is_active),
            last_activity_at: Set(session.last_activity_at),
            expires_at: Set(session.expires_at),
            created_at: Set(session.created_at),
        }
        .insert(&self.db)
        .await
        .context("create session")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, AuthServiceError> {
        let model = sessions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find session by id")?;
        Ok(model.map(session_from_model))
    }

    async fn revoke(&self, id: Uuid) -> Result<(), AuthServiceError> {
        // Zero rows affected is fine — revoke is idempotent.
        sessions::Entity::update_many()
            .col_expr(sessions::Column::IsActive, Expr::value(false))
            .col_expr(sessions::Column::LastActivityAt, Expr::value(Utc::now()))
            .filter(sessions::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("revoke session")?;
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        sessions::Entity::update_many()
            .col_expr(sessions::Column::IsActive, Expr::value(false))
            .col_expr(sessions::Column::LastActivityAt, Expr::value(Utc::now()))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .context("revoke all sessions")?;
        Ok(())
    }
}

fn session_from_model(model: sessions::Model) -> Session {
    Session {
        id: model.id,
        user_id: model.user_id,
        token: model.token,
        device: model.device,
        ip: model.ip,
        user_agent: model.user_agent,
        is_active: model.is_active,
        last_activity_at: model.last_activity_at,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}
