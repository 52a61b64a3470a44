//! Session authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hearth_core::types::UserId;
use hearth_notify::Identity;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user resolved from the session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID
    pub user_id: UserId,
    /// Username
    pub username: String,
}

impl From<Identity> for AuthenticatedUser {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            username: identity.username,
        }
    }
}

/// Authentication middleware function.
///
/// Accepts a bearer token or the session cookie.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match state.verifier.resolve(None, request.headers()) {
        Ok(identity) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from(identity));
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %request.uri().path(), "Unauthenticated request");
            e.into_response()
        }
    }
}

/// Extractor for authenticated user.
#[derive(Debug, Clone)]
pub struct Auth(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{app_state, token_for};
    use axum::{
        Router,
        http::{StatusCode, header::AUTHORIZATION, header::COOKIE},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    async fn whoami(Auth(user): Auth) -> String {
        format!("{}:{}", user.user_id, user.username)
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(state, auth_middleware))
    }

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let response = app(app_state())
            .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bearer_and_cookie_accepted() {
        let state = app_state();
        let token = token_for(&state, 3, "carol");

        let response = app(state.clone())
            .oneshot(
                Request::get("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state)
            .oneshot(
                Request::get("/whoami")
                    .header(COOKIE, format!("sessionid={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"3:carol");
    }

    #[test]
    fn test_authenticated_user_from_identity() {
        let user = AuthenticatedUser::from(Identity::new(UserId::new_unchecked(9), "dan"));
        assert_eq!(user.user_id.as_i64(), 9);
        assert_eq!(user.username, "dan");
    }
}
