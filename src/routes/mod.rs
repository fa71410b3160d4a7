pub mod health;
pub mod knowledge;
pub mod openapi;
pub mod results;
pub mod submission;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::require_bearer_auth,
    rate_limit::{per_user_rps_middleware, RateLimiter},
};
use crate::AppState;

/// All routes with auth and submission throttling applied. CORS and tracing
/// are layered on by the caller.
pub fn create_router(state: AppState, submit_rps: u32) -> Router {
    let submit_api = Router::new()
        .route("/api/tests/:id/submit", post(submission::submit_test))
        .route_layer(from_fn_with_state(
            RateLimiter::new(submit_rps),
            per_user_rps_middleware,
        ));

    let protected_api = Router::new()
        .route("/api/me/results", get(results::my_results))
        .route("/api/results/:id", get(results::get_result))
        .route("/api/tests/:id/results", get(results::list_results_for_test))
        .route("/api/me/modules/knowledge", get(knowledge::my_module_knowledge))
        .route("/api/me/courses/knowledge", get(knowledge::my_course_knowledge))
        .route("/api/modules/:id/knowledge", get(knowledge::module_knowledge))
        .route("/api/courses/:id/knowledge", get(knowledge::course_knowledge))
        .route("/api/modules/:id/access", get(knowledge::module_access))
        .merge(submit_api)
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json))
        .merge(protected_api)
        .with_state(state)
}
