//! Bearer-token extractor for the `Authorization` header.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;

/// Raw bearer token pulled from `Authorization: Bearer <token>`.
///
/// Returns 401 if the header is absent or not a Bearer scheme. Signature and
/// expiry validation is done by handlers via [`crate::token::validate_bearer_token`]
/// since only they hold the signing secret.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // In Rust 1.82+ precise capturing, `async fn` captures lifetimes differently,
    // causing E0195. Fix: extract values synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_owned());

        async move {
            let token = token.filter(|t| !t.is_empty()).ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self(token))
        }
    }
}
