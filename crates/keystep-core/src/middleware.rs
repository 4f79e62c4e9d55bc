use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use uuid::Uuid;

/// Stamps every request with a fresh UUID under `x-request-id`, so log lines
/// from one login attempt can be correlated across layers.
#[derive(Clone, Default)]
pub struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let value = Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(value))
    }
}

/// Apply with `.layer(request_id_layer())` when building the router.
pub fn request_id_layer() -> SetRequestIdLayer<MakeUuidRequestId> {
    SetRequestIdLayer::new(
        axum::http::HeaderName::from_static("x-request-id"),
        MakeUuidRequestId,
    )
}
