use crate::handlers::{
    ApiError, SharedProcessStore, create_process, create_processes, get_process, health,
    list_processes,
};
use crate::observability::observability_middleware;
use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

/// Largest accepted request body, a replace-all batch can be big.
pub const MAX_BODY_SIZE: usize = 100 * 1024 * 1024;

/// The body limit layer answers in plain text, rewrap it in the error envelope.
async fn payload_too_large_envelope(response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    warn!("request body rejected, limit is {MAX_BODY_SIZE} bytes");
    ApiError::PayloadTooLarge.into_response()
}

/// Builds the application router around `store`.
pub fn make_router(store: SharedProcessStore) -> Router {
    Router::new()
        .route("/api/process/{pid}", get(get_process))
        .route("/api/process", post(create_process))
        .route("/api/processes", get(list_processes).post(create_processes))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(middleware::map_response(payload_too_large_envelope))
        .layer(middleware::from_fn(observability_middleware))
        .layer(Extension(store))
}
