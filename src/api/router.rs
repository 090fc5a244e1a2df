use std::time::Duration;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::health;
use super::middleware::logging_middleware;
use super::state::AppState;
use super::users;

/// Create the full router with application state.
///
/// Requests still running after `request_timeout` are dropped and answered
/// with `408 Request Timeout`. Queries they started stay bounded by the
/// session `statement_timeout`. The logging
/// middleware sits outside the timeout so it records those 408s.
pub fn create_router_with_state(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route("/users", get(users::list_users).post(users::register_user))
        .route("/users/{id}", get(users::get_user).put(users::update_user))
        .route("/users/{id}/password", put(users::change_password))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
