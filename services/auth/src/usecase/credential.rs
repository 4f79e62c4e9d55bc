use argon2::{Argon2, PasswordHash, PasswordVerifier};

use crate::domain::repository::UserRepository;
use crate::domain::types::Identity;
use crate::error::AuthServiceError;

pub struct VerifyCredentialsInput {
    pub email: String,
    pub role: String,
    pub password: String,
}

pub struct VerifyCredentialsUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> VerifyCredentialsUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(
        &self,
        input: VerifyCredentialsInput,
    ) -> Result<Identity, AuthServiceError> {
        // Absent, inactive, and wrong-password all collapse to the same error
        // so responses never reveal whether an account exists.
        let user = self
            .users
            .find_by_email(&input.email, &input.role)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(&user.password, &input.password) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// Compare a submitted password against the stored credential.
///
/// Stored values come in two encodings: a PHC-format argon2 hash, verified
/// through the hash algorithm, or a legacy plaintext credential compared by
/// direct equality. The encoding is detected from the stored value's own tag,
/// which lets plaintext rows be rehashed over time with zero downtime.
pub fn verify_password(stored: &str, supplied: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default()
            .verify_password(supplied.as_bytes(), &hash)
            .is_ok(),
        Err(_) => stored == supplied,
    }
}
