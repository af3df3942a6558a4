//! Auth API endpoints
//!
//! - POST /api/auth/register - Register a new user
//! - POST /api/auth/login - Login and get a session token
//! - GET /api/auth/me - Get current user profile

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::app::AppState;
use crate::core::api::{ApiError, ApiJson, ApiResponse};
use crate::core::auth::middleware::AuthUser;
use crate::core::auth::service::{AuthError, AuthResponse, AuthService, LoginRequest, RegisterRequest};
use crate::core::db::models::UserProfile;

/// Generic 401 text for every token failure
const INVALID_TOKEN_MESSAGE: &str = "Invalid token. Please log in again.";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => ApiError::validation(errors),
            AuthError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AuthError::EmailAlreadyExists | AuthError::UsernameAlreadyExists => {
                ApiError::conflict(err.to_string())
            }
            AuthError::MissingToken | AuthError::UserNotFound => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::InvalidToken | AuthError::TokenExpired => {
                ApiError::unauthorized(INVALID_TOKEN_MESSAGE)
            }
            AuthError::InternalError(detail) => {
                tracing::error!("Auth failure: {}", detail);
                ApiError::internal()
            }
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Create the auth API router
pub fn auth_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(me_handler))
}

/// POST /api/auth/register
async fn register_handler(
    State(auth): State<AuthService>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    tracing::info!("Registration attempt for username: {}", request.username);

    let response = auth.register(request).await?;

    tracing::info!("User registered successfully: {}", response.user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(response).with_message("Registration successful")),
    ))
}

/// POST /api/auth/login
async fn login_handler(
    State(auth): State<AuthService>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let response = match auth.login(request).await {
        Ok(response) => response,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("User logged in successfully: {}", response.user.id);

    Ok(Json(ApiResponse::ok(response).with_message("Login successful")))
}

/// GET /api/auth/me
async fn me_handler(
    State(auth): State<AuthService>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = auth.current_user(user.id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
