//! JWT utilities for session token issue and verification
//!
//! Tokens are HS256-signed, carry the user id as `sub`, and are validated purely by
//! signature, issuer and expiry. There is no server-side session store.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::Config;

/// Default token expiration time (7 days)
const TOKEN_EXPIRATION_MINUTES: i64 = 7 * 24 * 60;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration in minutes
    pub expiration_minutes: i64,
    /// Token issuer
    pub issuer: String,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_minutes: TOKEN_EXPIRATION_MINUTES,
            issuer: "todoapp".to_string(),
        }
    }

    /// Build from the application config
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.clone())
            .expiration(config.jwt_expiration_minutes)
            .issuer(config.jwt_issuer.clone())
    }

    /// Set token expiration
    pub fn expiration(mut self, minutes: i64) -> Self {
        self.expiration_minutes = minutes;
        self
    }

    /// Set issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            // Malformed input, bad signature, wrong issuer: all the same to callers
            _ => JwtError::InvalidToken,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Get user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a signed token for a user
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = Duration::try_minutes(self.config.expiration_minutes)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                JwtError::EncodingError(format!(
                    "token lifetime of {} minutes is out of range",
                    self.config.expiration_minutes
                ))
            })?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validate and decode a token
    pub fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        // Strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Verify a token and return the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<Uuid, JwtError> {
        self.decode_claims(token)?.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig::new("test_secret_key_for_testing_only_32bytes!"))
    }

    // ========================================================================
    // JwtConfig Tests
    // ========================================================================

    #[test]
    fn test_jwt_config_new() {
        let config = JwtConfig::new("my_secret");

        assert_eq!(config.secret, "my_secret");
        assert_eq!(config.expiration_minutes, TOKEN_EXPIRATION_MINUTES);
        assert_eq!(config.issuer, "todoapp");
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("secret").expiration(30).issuer("my_app");

        assert_eq!(config.expiration_minutes, 30);
        assert_eq!(config.issuer, "my_app");
    }

    // ========================================================================
    // Issue / Verify Tests
    // ========================================================================

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).unwrap();
        assert!(!token.is_empty());

        assert_eq!(service.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_claims_expiry_matches_config() {
        let service = JwtService::new(JwtConfig::new("secret").expiration(90));
        let token = service.issue(Uuid::new_v4()).unwrap();

        let claims = service.decode_claims(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 90 * 60);
        assert_eq!(claims.iss, "todoapp");
    }

    #[test]
    fn test_issue_with_unrepresentable_lifetime_fails() {
        let service = JwtService::new(JwtConfig::new("secret").expiration(i64::MAX));

        let result = service.issue(Uuid::new_v4());
        assert!(matches!(result, Err(JwtError::EncodingError(_))));
    }

    #[test]
    fn test_verify_malformed_token() {
        let service = create_test_service();

        let result = service.verify("invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken)));

        let result = service.verify("");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let service1 = JwtService::new(JwtConfig::new("secret_one"));
        let service2 = JwtService::new(JwtConfig::new("secret_two"));

        let token = service1.issue(Uuid::new_v4()).unwrap();

        let result = service2.verify(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_verify_wrong_issuer() {
        let issuer_a = JwtService::new(JwtConfig::new("shared").issuer("a"));
        let issuer_b = JwtService::new(JwtConfig::new("shared").issuer("b"));

        let token = issuer_a.issue(Uuid::new_v4()).unwrap();

        let result = issuer_b.verify(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        // Negative expiration puts exp in the past
        let service = JwtService::new(JwtConfig::new("test_secret").expiration(-1));

        let token = service.issue(Uuid::new_v4()).unwrap();

        let result = service.verify(&token);
        assert!(
            matches!(result, Err(JwtError::Expired)),
            "Expected Expired error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = create_test_service();
        let token = service.issue(Uuid::new_v4()).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let other = service.issue(Uuid::new_v4()).unwrap();
        let other_payload = other.split('.').nth(1).unwrap().to_string();
        parts[1] = &other_payload;
        let forged = parts.join(".");

        assert!(matches!(service.verify(&forged), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_non_uuid_subject_is_invalid() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: 0,
            exp: 0,
            iss: "todoapp".to_string(),
        };

        assert!(matches!(claims.user_id(), Err(JwtError::InvalidToken)));
    }

    // ========================================================================
    // Error Tests
    // ========================================================================

    #[test]
    fn test_jwt_error_display() {
        assert_eq!(format!("{}", JwtError::Expired), "Token expired");
        assert_eq!(format!("{}", JwtError::InvalidToken), "Invalid token");
    }
}
