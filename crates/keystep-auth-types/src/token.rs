//! JWT bearer-token validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use serde::Serialize;
use uuid::Uuid;

/// User identity extracted from a validated bearer token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub token_exp: u64,
}

/// Errors returned by [`validate_bearer_token`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload shared by token creation (auth service) and validation
/// (authorization middleware in downstream services).
///
/// # Fields
///
/// | Field | JWT claim | Rust type | Meaning |
/// |-------|-----------|-----------|---------|
/// | `sub` | `sub` | UUID string | user ID |
/// | `email` | custom | `String` | user email at issuance |
/// | `role` | custom | `String` | role label (e.g. `USER`) |
/// | `exp` | `exp` | seconds since epoch | token expiration |
///
/// # Feature gate
///
/// [`Deserialize`] is always available — all consumers validate tokens.
/// [`Serialize`] requires the **`USE_ONLY_IN_AUTH_SERVICE`** cargo feature. Only the auth
/// service enables it because it is the sole token issuer.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
pub struct JwtClaims {
    /// User ID (UUID string).
    pub sub: String,
    /// User email at the time the token was issued.
    pub email: String,
    /// Role label carried through for downstream authorization.
    pub role: String,
    /// Expiration timestamp (seconds since UNIX epoch).
    pub exp: u64,
}

/// Decode and validate a JWT, returning raw claims.
///
/// Validation: HS256, exp checked, required claims: `exp` + `sub`.
/// Default leeway = 60s — tolerates clock skew between services.
fn decode_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_) => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

/// Validate a bearer-token value, returning parsed identity.
///
/// This is the primary public API for token validation. Authorization
/// middleware calls this on every request to extract user identity from the
/// `Authorization` header.
pub fn validate_bearer_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    let claims = decode_jwt(token, secret)?;
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        email: claims.email,
        role: claims.role,
        token_exp: claims.exp,
    })
}
