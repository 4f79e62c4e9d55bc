use std::net::SocketAddr;

use sea_orm::Database;
use tracing::info;

use keystep_auth::config::AuthConfig;
use keystep_auth::router::build_router;
use keystep_auth::state::AppState;

#[tokio::main]
async fn main() {
    keystep_core::tracing::init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        jwt_secret: config.jwt_secret,
        otp_config: config.otp,
        session_config: config.session,
        expose_codes: config.expose_codes,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
