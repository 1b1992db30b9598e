pub mod auth;
mod error;
mod uploads;
mod validation;

pub use error::{ApiError, ErrorCode};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all));

    let upload_routes = Router::new()
        .route(
            "/profile-picture",
            post(uploads::upload_profile_picture).delete(uploads::delete_profile_picture),
        )
        // Multipart bodies carry the image itself; cap them
        .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_BYTES));

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/upload", upload_routes)
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Origins come from configuration; an empty list (development) allows any.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "message": "Snappy API is running!" }))
}
