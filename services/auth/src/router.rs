use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use keystep_core::health::{healthz, readyz};
use keystep_core::middleware::request_id_layer;

use crate::handlers::{
    login::{credential_validation, final_login, legacy_login, send_otp},
    session::{revoke_all_sessions, revoke_session, validate_session},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Login steps
        .route("/auth/login/credentials", post(credential_validation))
        .route("/auth/login/otp", post(send_otp))
        .route("/auth/login/verify", post(final_login))
        // Legacy step dispatcher
        .route("/auth/login", post(legacy_login))
        // Sessions
        .route("/auth/session/{session_id}", get(validate_session))
        .route("/auth/session/{session_id}", delete(revoke_session))
        .route("/auth/sessions", delete(revoke_all_sessions))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
