//! Authentication service
//!
//! Business logic for registration, login, and resolving a bearer token to a live user.
//! Coordinates between the user repository and the JWT service.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::middleware::AuthUser;
use crate::core::db::models::{CreateUser, UserProfile, UserResponse};
use crate::core::db::repositories::{UserRepository, UserRepositoryError};
use crate::core::validation::{
    FieldError, Validator, validate_email, validate_password, validate_username,
};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Access denied. No token provided.")]
    MissingToken,

    #[error("Invalid token. Please log in again.")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found. Token is invalid.")]
    UserNotFound,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            UserRepositoryError::UsernameAlreadyExists => AuthError::UsernameAlreadyExists,
            UserRepositoryError::DatabaseError(e) => AuthError::InternalError(e.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::InvalidToken => AuthError::InvalidToken,
            JwtError::EncodingError(e) => AuthError::InternalError(e),
        }
    }
}

/// Registration request data
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request data
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Authentication response with user data and a session token
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Emails are compared case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_service: JwtService,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(users: Arc<dyn UserRepository>, jwt_service: JwtService, bcrypt_cost: u32) -> Self {
        Self {
            users,
            jwt_service,
            bcrypt_cost,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// bcrypt is CPU-bound, so it runs off the async workers
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let username = request.username.trim().to_string();
        let email = normalize_email(&request.email);

        let mut validator = Validator::new();
        validator.check(validate_username(&username));
        validator.check(validate_email(&email));
        validator.check(validate_password(&request.password));
        validator.finish().map_err(AuthError::Validation)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AuthError::UsernameAlreadyExists);
        }

        let password_hash = self.hash_password(&request.password).await?;

        let user = self
            .users
            .create(&CreateUser {
                username,
                email,
                password_hash,
            })
            .await?;

        let token = self.jwt_service.issue(user.id)?;

        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// Login an existing user
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .verify_password(&request.password, &user.password_hash)
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt_service.issue(user.id)?;

        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// Profile of an already authenticated user
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    /// Resolve a bearer token to a live user
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let user_id = self.jwt_service.verify(token)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::jwt::JwtConfig;
    use crate::core::db::repositories::InMemoryUserRepository;

    fn create_test_service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            JwtService::new(JwtConfig::new("test_secret")),
            4,
        )
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    // ========================================================================
    // Registration Tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_returns_user_and_valid_token() {
        let service = create_test_service();

        let response = service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(response.user.username, "alice");
        assert_eq!(response.user.email, "alice@example.com");
        assert_eq!(
            service.jwt_service().verify(&response.token).unwrap(),
            response.user.id
        );
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let service = create_test_service();

        let response = service
            .register(register_request("alice", "  Alice@Example.COM "))
            .await
            .unwrap();

        assert_eq!(response.user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let service = create_test_service();

        let result = service
            .register(RegisterRequest {
                username: "a!".to_string(),
                email: "not-an-email".to_string(),
                password: "123".to_string(),
            })
            .await;

        match result {
            Err(AuthError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["username", "email", "password"]);
            }
            other => panic!("Expected validation error, got {:?}", other.map(|r| r.user)),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = create_test_service();
        service
            .register(register_request("alice", "shared@example.com"))
            .await
            .unwrap();

        let result = service
            .register(register_request("bob", "SHARED@example.com"))
            .await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let service = create_test_service();
        service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = service
            .register(register_request("alice", "other@example.com"))
            .await;
        assert!(matches!(result, Err(AuthError::UsernameAlreadyExists)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_registration_same_email() {
        let service = create_test_service();

        let (first, second) = tokio::join!(
            service.register(register_request("alice", "race@example.com")),
            service.register(register_request("bob", "race@example.com")),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(AuthError::EmailAlreadyExists)))
        );
    }

    // ========================================================================
    // Login Tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_success() {
        let service = create_test_service();
        let registered = service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let response = service
            .login(LoginRequest {
                email: "Alice@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.user.id, registered.user.id);
        assert_eq!(
            service.jwt_service().verify(&response.token).unwrap(),
            registered.user.id
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = create_test_service();
        service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let wrong_password = service
            .login(LoginRequest {
                email: "alice@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();
        let missing_fields = service.login(LoginRequest::default()).await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert!(matches!(missing_fields, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    // ========================================================================
    // Token Resolution Tests
    // ========================================================================

    #[tokio::test]
    async fn test_authenticate_resolves_user() {
        let service = create_test_service();
        let registered = service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let user = service.authenticate(&registered.token).await.unwrap();
        assert_eq!(user.id, registered.user.id);
        assert_eq!(user.username, "alice");

        let profile = service.current_user(user.id).await.unwrap();
        assert_eq!(profile.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let service = create_test_service();
        let token = service.jwt_service().issue(Uuid::new_v4()).unwrap();

        let result = service.authenticate(&token).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_and_expired_tokens() {
        let service = create_test_service();
        assert!(matches!(
            service.authenticate("garbage").await,
            Err(AuthError::InvalidToken)
        ));

        let expired = JwtService::new(JwtConfig::new("test_secret").expiration(-1))
            .issue(Uuid::new_v4())
            .unwrap();
        assert!(matches!(
            service.authenticate(&expired).await,
            Err(AuthError::TokenExpired)
        ));
    }

    // ========================================================================
    // Error Conversion Tests
    // ========================================================================

    #[test]
    fn test_auth_error_from_user_repository_error() {
        let err: AuthError = UserRepositoryError::EmailAlreadyExists.into();
        assert!(matches!(err, AuthError::EmailAlreadyExists));

        let err: AuthError = UserRepositoryError::UsernameAlreadyExists.into();
        assert!(matches!(err, AuthError::UsernameAlreadyExists));

        let err: AuthError = UserRepositoryError::DatabaseError(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    #[test]
    fn test_auth_error_from_jwt_error() {
        let err: AuthError = JwtError::Expired.into();
        assert!(matches!(err, AuthError::TokenExpired));

        let err: AuthError = JwtError::InvalidToken.into();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn test_register_request_missing_fields_default_to_empty() {
        let request: RegisterRequest = serde_json::from_str(r#"{"email": "a@b.co"}"#).unwrap();
        assert_eq!(request.email, "a@b.co");
        assert!(request.username.is_empty());
        assert!(request.password.is_empty());
    }
}
