//! API route definitions.

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::CorsConfig;
use crate::handlers::{health, notifications};
use crate::middleware::{RequestIdLayer, auth_middleware, csrf_middleware};
use crate::state::AppState;
use crate::ws::ws_handler;

/// Creates the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.cors);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics));

    // Session-protected routes; auth runs before the CSRF check
    let notification_routes = Router::new()
        .route(
            "/notifications/api/",
            get(notifications::list_notifications).fallback(notifications::method_not_allowed),
        )
        .route(
            "/notifications/mark-as-read/",
            post(notifications::mark_all_as_read).fallback(notifications::method_not_allowed),
        )
        .route(
            "/notifications/{id}/read/",
            post(notifications::mark_one_read).fallback(notifications::method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            csrf_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // WebSocket route (authenticates inside the upgraded socket)
    let ws_routes = Router::new().route("/ws/notifications/", get(ws_handler));

    Router::new()
        .merge(public_routes)
        .merge(notification_routes)
        .merge(ws_routes)
        .fallback(notifications::not_found)
        .layer(cors)
        .layer(RequestIdLayer::new())
        .with_state(state)
}

/// Builds the CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let mut cors = CorsLayer::new();

    // Wildcards cannot be combined with credentials, so mirror instead
    if config.allow_credentials {
        cors = cors
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request());
        cors = if origins.is_empty() {
            cors.allow_origin(AllowOrigin::mirror_request())
        } else {
            cors.allow_origin(origins)
        };
    } else {
        cors = cors.allow_methods(Any).allow_headers(Any);
        cors = if origins.is_empty() {
            cors.allow_origin(Any)
        } else {
            cors.allow_origin(origins)
        };
    }

    cors.max_age(std::time::Duration::from_secs(config.max_age_secs))
}
