//! API Routes
//!
//! Configures the Axum router with the recipe cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_get_handler, batch_set_handler, delete_handler, get_handler, health_handler,
    lookup_handler, set_handler, stats_handler, AppState,
};
use super::middleware::limit_api_routes;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /api/recipes` - Cache a recipe
/// - `GET /api/recipes?ids=a,b` - Read several recipes, served from the response cache
/// - `GET /api/recipes/:id` - Read a cached recipe
/// - `DELETE /api/recipes/:id` - Invalidate a cached recipe
/// - `POST /api/recipes/batch/get` - Read several recipes in request order
/// - `PUT /api/recipes/batch` - Cache several recipes
/// - `GET /api/stats` - Cache and admission statistics
/// - `GET /health` - Health check endpoint (not rate limited)
///
/// Everything under `/api` is admitted under the general API policy.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/recipes", put(set_handler).get(lookup_handler))
        .route("/recipes/batch", put(batch_set_handler))
        .route("/recipes/batch/get", post(batch_get_handler))
        .route("/recipes/:id", get(get_handler).delete(delete_handler))
        .route("/stats", get(stats_handler));
    let api = limit_api_routes(api, &state);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
