//! Session token verification.
//!
//! The listing site signs a short JWT for each logged-in session. This module
//! turns such a token back into an [`Identity`], whichever way the browser
//! presented it.

use axum::http::{HeaderMap, header::AUTHORIZATION, header::COOKIE};
use chrono::{Duration, Utc};
use hearth_core::types::UserId;
use hearth_notify::Identity;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric user ID)
    pub sub: String,
    /// Username
    pub username: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// JWT ID (unique identifier)
    pub jti: String,
}

impl Claims {
    /// Converts verified claims into an identity.
    pub fn identity(&self) -> Result<Identity, ApiError> {
        let user_id: UserId = self
            .sub
            .parse()
            .map_err(|e| ApiError::Unauthorized(format!("Invalid subject: {e}")))?;
        Ok(Identity::new(user_id, self.username.clone()))
    }
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct SessionVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration_secs: i64,
    cookie_name: String,
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_secs", &self.expiration_secs)
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl SessionVerifier {
    /// Creates a verifier from configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiration_secs: i64::try_from(config.expiration_secs).unwrap_or(i64::MAX),
            cookie_name: config.cookie_name.clone(),
        }
    }

    /// Signs a session token for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if token encoding fails.
    pub fn issue_token(&self, identity: &Identity) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = Duration::try_seconds(self.expiration_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| ApiError::Internal("Session lifetime out of range".to_string()))?;

        let claims = Claims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to issue token: {e}")))
    }

    /// Validates a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))?;

        Ok(token_data.claims)
    }

    /// Validates a token and resolves the identity it names.
    pub fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        self.validate_token(token)?.identity()
    }

    /// Finds the session token on a request.
    ///
    /// Precedence: explicit query token, then `Authorization: Bearer`, then
    /// the session cookie.
    #[must_use]
    pub fn find_token<'a>(
        &self,
        query_token: Option<&'a str>,
        headers: &'a HeaderMap,
    ) -> Option<&'a str> {
        query_token
            .filter(|t| !t.is_empty())
            .or_else(|| {
                headers
                    .get(AUTHORIZATION)
                    .and_then(|h| h.to_str().ok())
                    .and_then(extract_bearer_token)
            })
            .or_else(|| cookie_value(headers, &self.cookie_name))
    }

    /// Resolves the identity of a request.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if no token is present or it fails verification.
    pub fn resolve(
        &self,
        query_token: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<Identity, ApiError> {
        let token = self
            .find_token(query_token, headers)
            .ok_or_else(|| ApiError::Unauthorized("No session".to_string()))?;
        self.verify(token)
    }
}

/// Extracts the bearer token from an Authorization header value.
#[must_use]
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Returns the value of cookie `name`, searching every `Cookie` header.
#[must_use]
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}
