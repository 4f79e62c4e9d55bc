use std::net::SocketAddr;

use axum::http::{HeaderMap, header};
use serde::Serialize;

pub mod login;
pub mod session;

/// Success envelope: `status` + `message` with the payload flattened beside
/// them.
#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: u16,
    pub message: &'static str,
    #[serde(flatten)]
    pub data: T,
}

/// Caller IP: first hop of `x-forwarded-for` when present, else the socket
/// peer address.
pub(crate) fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .or_else(|| Some(addr.ip().to_string()))
}

pub(crate) fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned())
}
