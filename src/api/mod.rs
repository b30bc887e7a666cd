//! API Module
//!
//! HTTP handlers, routing and rate-limit middleware.
//!
//! # Endpoints
//! - `PUT /api/recipes` - Cache a recipe
//! - `GET /api/recipes?ids=a,b` - Cached lookup
//! - `GET /api/recipes/:id` - Read a cached recipe
//! - `DELETE /api/recipes/:id` - Invalidate a cached recipe
//! - `POST /api/recipes/batch/get` - Batch read
//! - `PUT /api/recipes/batch` - Batch write
//! - `GET /api/stats` - Statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::{
    caller_identity, limit_api_routes, limit_auth_routes, limit_routes, rate_limit, RateLimit,
};
pub use routes::create_router;
