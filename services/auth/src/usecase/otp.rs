use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rand::RngExt;
use uuid::Uuid;

use crate::domain::repository::{DeliveryChannel, OtpRepository};
use crate::domain::types::{OtpCode, OtpPurpose};
use crate::error::AuthServiceError;

/// Code-issuance tunables, passed in at construction so tests can vary them.
/// Defaults: 6-digit codes, 10-minute TTL, UTC reference zone.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub ttl_minutes: i64,
    pub code_length: usize,
    pub time_zone: Tz,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 10,
            code_length: 6,
            time_zone: chrono_tz::UTC,
        }
    }
}

const DIGITS: &[u8] = b"0123456789";

/// Fixed-width numeric code from the thread CSPRNG. Leading zeros are kept;
/// codes are stored and compared as strings, never parsed as numbers.
fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| DIGITS[rng.random_range(0..DIGITS.len())] as char)
        .collect()
}

pub struct IssueOtpInput {
    pub user_id: Uuid,
    pub purpose: OtpPurpose,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub origin_ip: Option<String>,
}

#[derive(Debug)]
pub struct IssueOtpOutput {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

pub struct IssueOtpUseCase<O, S, E>
where
    O: OtpRepository,
    S: DeliveryChannel,
    E: DeliveryChannel,
{
    pub otp_codes: O,
    pub sms: S,
    pub email: E,
    pub config: OtpConfig,
}

impl<O, S, E> IssueOtpUseCase<O, S, E>
where
    O: OtpRepository,
    S: DeliveryChannel,
    E: DeliveryChannel,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<IssueOtpOutput, AuthServiceError> {
        // The phone target is the one verification is bound to; email only
        // becomes the target when it is the sole channel present.
        let target = input
            .phone
            .clone()
            .or_else(|| input.email.clone())
            .ok_or_else(|| {
                AuthServiceError::Validation(vec!["no delivery target for code".to_owned()])
            })?;

        let code_str = generate_code(self.config.code_length);

        // Expiry is computed in the configured reference zone and stored as an
        // absolute instant, so later comparison against "now" cannot depend on
        // the server-local zone.
        let now_local = Utc::now().with_timezone(&self.config.time_zone);
        let expires_at = (now_local + Duration::minutes(self.config.ttl_minutes))
            .with_timezone(&Utc);

        let record = OtpCode {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            target,
            purpose: input.purpose,
            code: code_str.clone(),
            attempts: 0,
            origin_ip: input.origin_ip.clone(),
            expires_at,
            used_at: None,
            created_at: now_local.with_timezone(&Utc),
        };
        self.otp_codes.create(&record).await?;

        // Both channels are dispatched together and awaited jointly. A failed
        // channel is logged and suppressed: issuance has already succeeded,
        // and one channel failing must not abort the other.
        let sms_send = async {
            match &input.phone {
                Some(phone) => Some(self.sms.send_code(phone, &code_str, input.purpose).await),
                None => None,
            }
        };
        let email_send = async {
            match &input.email {
                Some(email) => Some(self.email.send_code(email, &code_str, input.purpose).await),
                None => None,
            }
        };
        let (sms_result, email_result) = futures::join!(sms_send, email_send);
        if let Some(Err(e)) = sms_result {
            tracing::warn!(error = %e, purpose = %input.purpose, "sms delivery failed");
        }
        if let Some(Err(e)) = email_result {
            tracing::warn!(error = %e, purpose = %input.purpose, "email delivery failed");
        }

        Ok(IssueOtpOutput {
            code: code_str,
            expires_at,
        })
    }
}

pub struct VerifyOtpInput {
    pub user_id: Uuid,
    pub target: String,
    pub purpose: OtpPurpose,
    pub code: String,
}

pub struct VerifyOtpUseCase<O>
where
    O: OtpRepository,
{
    pub otp_codes: O,
}

impl<O> VerifyOtpUseCase<O>
where
    O: OtpRepository,
{
    /// Check the submitted code against the latest record for the triple.
    ///
    /// Read-only: a matching record is returned but NOT consumed here. The
    /// caller decides when to burn it (see `FinalLoginUseCase`), so a failure
    /// after verification cannot strand a half-used code.
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<OtpCode, AuthServiceError> {
        let record = self
            .otp_codes
            .find_latest(input.user_id, &input.target, input.purpose)
            .await?
            .ok_or(AuthServiceError::OtpNotFound)?;

        if record.used_at.is_some() {
            return Err(AuthServiceError::OtpUsed);
        }
        if Utc::now() >= record.expires_at {
            return Err(AuthServiceError::OtpExpired);
        }
        // String comparison preserves leading-zero codes.
        if record.code.trim() != input.code.trim() {
            return Err(AuthServiceError::OtpMismatch);
        }

        Ok(record)
    }
}
