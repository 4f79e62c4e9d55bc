use axum::http::StatusCode;

/// `GET /healthz` — liveness. Always 200 while the process is up.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz` — readiness. Services with external dependencies worth
/// gating on (database, delivery provider) should mount their own handler.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
