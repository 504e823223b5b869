pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;

use std::time::Duration;

use axum::{http::StatusCode, routing::post, Router};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Path of the plan generation endpoint.
pub const GENERATE_PLAN_PATH: &str = "/generate-plan";
/// Upper bound on handling a single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application router.
pub fn create_app() -> Router {
    Router::new()
        .route(GENERATE_PLAN_PATH, post(handlers::generate_plan))
        // Layers wrap outward: the id is set before propagation sees the request.
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(TraceLayer::new_for_http())
}
