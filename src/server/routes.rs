//! HTTP routes definition

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// User record routes
///
/// - POST /create        - Create a user, returns its UID
/// - POST /update/:uid   - Overwrite email and/or address
/// - GET  /get/:uid      - Fetch name, email and address
/// - GET  /lookup/:name  - Resolve a name to its UID
pub fn user_routes() -> Router {
    Router::new()
        .route("/create", post(handlers::create_user))
        .route("/update/:uid", post(handlers::update_user))
        .route("/get/:uid", get(handlers::get_user))
        .route("/lookup/:name", get(handlers::lookup_user))
}

/// Admin routes
pub fn admin_routes() -> Router {
    Router::new()
        .route("/_admin/reset", post(handlers::reset_store))
        .route("/_stats", get(handlers::store_stats))
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/_health", get(handlers::health_check))
}
