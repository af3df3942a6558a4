//! Authentication extractor
//!
//! Handlers that take an [`AuthUser`] argument only run for requests carrying a valid
//! bearer token of a user that still exists. Everything else is rejected with 401:
//!
//! 1. No `Authorization: Bearer <token>` header -> "Access denied. No token provided."
//! 2. Signature, issuer or expiry check fails -> "Invalid token. Please log in again."
//! 3. Token subject no longer exists -> "User not found. Token is invalid."

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::auth::service::{AuthError, AuthService};

/// The caller's identity, resolved from the bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            tracing::debug!("Rejected {}: no bearer token", parts.uri.path());
            return Err(AuthError::MissingToken);
        };

        let auth_service = AuthService::from_ref(state);

        match auth_service.authenticate(token).await {
            Ok(user) => Ok(user),
            Err(err) => {
                match &err {
                    AuthError::InternalError(detail) => {
                        tracing::error!("Token resolution failed: {}", detail)
                    }
                    other => tracing::warn!("Rejected {}: {}", parts.uri.path(), other),
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer my_token_123"),
        );

        assert_eq!(bearer_token(&headers), Some("my_token_123"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_other_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic base64credentials"),
        );

        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer    "));
        assert_eq!(bearer_token(&headers), None);
    }
}
