//! Axum router wiring.
//!
//! Every route, the fallback included, runs behind the request
//! instrumentation middleware.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{api::users, app_state::AppState, obs, ops};

pub fn build_router(state: AppState) -> Router {
    let instrumentation = state.instrumentation();
    let health_path = state.cfg().server.health_path.clone();

    Router::new()
        .route("/api/users", get(users::list_users).post(users::add_user))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/error", post(users::simulate_error))
        .route(&health_path, get(ops::health))
        .route("/metrics", get(ops::metrics))
        .fallback(users::not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            instrumentation,
            obs::track_requests,
        ))
}
