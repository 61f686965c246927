//! Capa HTTP (axum): rutas, middlewares y handlers.

pub mod handlers;
pub mod security;
pub mod state;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

pub use state::AppState;

async fn handle_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND,
     Json(json!({
         "error": true,
         "kind": "not_found",
         "message": "Not found. See /health and /ready for service status.",
     })))
}

async fn handle_405() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED,
     Json(json!({
         "error": true,
         "kind": "method_not_allowed",
         "message": "Method not allowed.",
     })))
}

/// Router completo. El orden de capas deja `request_id` por fuera para que
/// también las respuestas 401/500 del control de acceso lleven `X-Request-Id`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new().route("/health", get(handlers::health))
                 .route("/ready", get(handlers::ready))
                 .route("/predict/by-id/:employee_id", post(handlers::predict_by_id))
                 .route("/predict/by-features", post(handlers::predict_by_features))
                 .route("/predictions/latest", get(handlers::latest_predictions))
                 .fallback(handle_404)
                 .method_not_allowed_fallback(handle_405)
                 .layer(middleware::from_fn_with_state(state.clone(), security::require_api_key))
                 .layer(middleware::from_fn(security::request_id))
                 .layer(TraceLayer::new_for_http())
                 .with_state(state)
}
