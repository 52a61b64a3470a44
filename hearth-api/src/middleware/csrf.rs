//! CSRF double-submit check.
//!
//! State-changing requests must echo the CSRF cookie in a header. Safe
//! methods pass through untouched.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::cookie_value;
use crate::error::ApiError;
use crate::state::AppState;

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// CSRF middleware function.
pub async fn csrf_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_safe(request.method()) {
        return next.run(request).await;
    }

    let session = &state.config.session;
    let headers = request.headers();
    let Some(cookie) = cookie_value(headers, &session.csrf_cookie_name) else {
        return ApiError::Forbidden("CSRF cookie not set".to_string()).into_response();
    };
    let header = headers
        .get(session.csrf_header_name.as_str())
        .and_then(|h| h.to_str().ok());

    if header != Some(cookie) {
        tracing::warn!(path = %request.uri().path(), "CSRF token mismatch");
        return ApiError::Forbidden("CSRF token missing or incorrect".to_string())
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::app_state;
    use axum::{
        Router,
        http::{StatusCode, header::COOKIE},
        middleware::from_fn_with_state,
        routing::post,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/submit", post(|| async { "ok" }).get(|| async { "ok" }))
            .layer(from_fn_with_state(app_state(), csrf_middleware))
    }

    async fn status(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_safe_method_skips_check() {
        let request = Request::get("/submit").body(Body::empty()).unwrap();
        assert_eq!(status(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_matching_token_passes() {
        let request = Request::post("/submit")
            .header(COOKIE, "csrftoken=abc123")
            .header("X-CSRFToken", "abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_or_wrong_token_forbidden() {
        let no_cookie = Request::post("/submit")
            .header("X-CSRFToken", "abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(no_cookie).await, StatusCode::FORBIDDEN);

        let no_header = Request::post("/submit")
            .header(COOKIE, "csrftoken=abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(no_header).await, StatusCode::FORBIDDEN);

        let mismatch = Request::post("/submit")
            .header(COOKIE, "csrftoken=abc123")
            .header("X-CSRFToken", "zzz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(mismatch).await, StatusCode::FORBIDDEN);
    }
}
