use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use keystep_auth_types::token::JwtClaims;

use crate::domain::repository::{DeliveryChannel, OtpRepository, SessionRepository, UserRepository};
use crate::domain::types::{Identity, OtpPurpose, Session};
use crate::error::AuthServiceError;
use crate::usecase::credential::VerifyCredentialsUseCase;
use crate::usecase::otp::{IssueOtpInput, IssueOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};
use crate::usecase::session::{CreateSessionInput, CreateSessionUseCase};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

/// Sign a bearer token embedding the identity's id/email/role.
pub fn issue_bearer_token(
    user: &Identity,
    ttl_secs: u64,
    secret: &str,
) -> Result<(String, u64), AuthServiceError> {
    let exp = now_secs() + ttl_secs;
    let claims = JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

/// The legacy single-endpoint dispatcher routes on this closed set of step
/// names. Anything outside it is an explicit error, never a fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    CredentialValidation,
    SendOtp,
    FinalLogin,
}

impl LoginStep {
    pub fn parse(step: &str) -> Result<Self, AuthServiceError> {
        match step {
            "credential_validation" => Ok(Self::CredentialValidation),
            "send_otp" => Ok(Self::SendOtp),
            "final_login" => Ok(Self::FinalLogin),
            other => Err(AuthServiceError::UnknownStep(other.to_owned())),
        }
    }
}

// ── Step 1: credential validation ─────────────────────────────────────────────

pub struct CredentialValidationInput {
    pub email: String,
    pub password: String,
    pub role: String,
    pub origin_ip: Option<String>,
}

#[derive(Debug)]
pub struct CredentialValidationOutput {
    pub user_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

pub struct CredentialValidationUseCase<U, O, S, E>
where
    U: UserRepository,
    O: OtpRepository,
    S: DeliveryChannel,
    E: DeliveryChannel,
{
    pub credentials: VerifyCredentialsUseCase<U>,
    pub otp: IssueOtpUseCase<O, S, E>,
}

impl<U, O, S, E> CredentialValidationUseCase<U, O, S, E>
where
    U: UserRepository,
    O: OtpRepository,
    S: DeliveryChannel,
    E: DeliveryChannel,
{
    pub async fn execute(
        &self,
        input: CredentialValidationInput,
    ) -> Result<CredentialValidationOutput, AuthServiceError> {
        let user = self
            .credentials
            .execute(crate::usecase::credential::VerifyCredentialsInput {
                email: input.email,
                role: input.role,
                password: input.password,
            })
            .await?;

        let issued = self
            .otp
            .execute(IssueOtpInput {
                user_id: user.id,
                purpose: OtpPurpose::Login,
                phone: user.phone.clone(),
                email: Some(user.email.clone()),
                origin_ip: input.origin_ip,
            })
            .await?;

        Ok(CredentialValidationOutput {
            user_id: user.id,
            code: issued.code,
            expires_at: issued.expires_at,
        })
    }
}

// ── Step 2: send OTP by mobile ────────────────────────────────────────────────

pub struct SendOtpInput {
    pub mobile: String,
    pub role: String,
    pub origin_ip: Option<String>,
}

#[derive(Debug)]
pub struct SendOtpOutput {
    pub user_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SendOtpUseCase<U, O, S, E>
where
    U: UserRepository,
    O: OtpRepository,
    S: DeliveryChannel,
    E: DeliveryChannel,
{
    pub users: U,
    pub otp: IssueOtpUseCase<O, S, E>,
}

impl<U, O, S, E> SendOtpUseCase<U, O, S, E>
where
    U: UserRepository,
    O: OtpRepository,
    S: DeliveryChannel,
    E: DeliveryChannel,
{
    pub async fn execute(&self, input: SendOtpInput) -> Result<SendOtpOutput, AuthServiceError> {
        let user = self
            .users
            .find_by_phone(&input.mobile, &input.role)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthServiceError::InvalidCredentials)?;

        let issued = self
            .otp
            .execute(IssueOtpInput {
                user_id: user.id,
                purpose: OtpPurpose::Login,
                phone: Some(input.mobile),
                email: Some(user.email.clone()),
                origin_ip: input.origin_ip,
            })
            .await?;

        Ok(SendOtpOutput {
            user_id: user.id,
            code: issued.code,
            expires_at: issued.expires_at,
        })
    }
}

// ── Step 3: final login ───────────────────────────────────────────────────────

pub struct FinalLoginInput {
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub role: String,
    pub code: String,
    pub device: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug)]
pub struct FinalLoginOutput {
    pub user: Identity,
    pub token: String,
    pub token_exp: u64,
    pub session: Session,
}

pub struct FinalLoginUseCase<U, O, S>
where
    U: UserRepository,
    O: OtpRepository,
    S: SessionRepository,
{
    pub users: U,
    pub otp: VerifyOtpUseCase<O>,
    pub sessions: CreateSessionUseCase<S>,
    pub jwt_secret: String,
}

impl<U, O, S> FinalLoginUseCase<U, O, S>
where
    U: UserRepository,
    O: OtpRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        input: FinalLoginInput,
    ) -> Result<FinalLoginOutput, AuthServiceError> {
        let user = match (&input.email, &input.mobile) {
            (Some(email), _) => self.users.find_by_email(email, &input.role).await?,
            (None, Some(mobile)) => self.users.find_by_phone(mobile, &input.role).await?,
            (None, None) => {
                return Err(AuthServiceError::Validation(vec![
                    "email or mobile is required".to_owned(),
                ]));
            }
        }
        .filter(|u| u.is_active)
        .ok_or(AuthServiceError::InvalidCredentials)?;

        // Verification runs against the mobile target: the supplied one, or
        // the stored phone when the caller logged in by email.
        let target = input
            .mobile
            .clone()
            .or_else(|| user.phone.clone())
            .ok_or(AuthServiceError::MobileRequired)?;

        let record = self
            .otp
            .execute(VerifyOtpInput {
                user_id: user.id,
                target,
                purpose: OtpPurpose::Login,
                code: input.code,
            })
            .await?;

        // Burn the code before minting the session: a concurrent replay of
        // the same code must lose here, and a session-creation failure past
        // this point is not retryable by replaying the code.
        if !self.otp.otp_codes.consume(record.id).await? {
            return Err(AuthServiceError::OtpUsed);
        }

        let token_ttl_secs = (self.sessions.config.ttl_hours * 3600) as u64;
        let (token, token_exp) = issue_bearer_token(&user, token_ttl_secs, &self.jwt_secret)?;

        let session = self
            .sessions
            .execute(CreateSessionInput {
                user_id: user.id,
                token: token.clone(),
                device: input.device,
                ip: input.ip,
                user_agent: input.user_agent,
            })
            .await?;

        Ok(FinalLoginOutput {
            user,
            token,
            token_exp,
            session,
        })
    }
}
