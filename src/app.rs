//! Application wiring: shared state, the combined router and its layers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::core::api::{
    ApiError, ApiResponse, method_not_allowed_handler, not_found_handler,
};
use crate::core::auth::{AuthService, JwtConfig, JwtService, auth_api_router};
use crate::core::config::{Config, ConfigError};
use crate::core::db::{
    InMemoryTodoRepository, InMemoryUserRepository, PgPool, PgTodoRepository, PgUserRepository,
    TodoRepository, UserRepository, health_check,
};
use crate::core::todos::{TodoService, todo_api_router};

/// State shared by every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth: AuthService,
    pub todos: TodoService,
    /// `None` when running on the in-memory store
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: &Config,
        users: Arc<dyn UserRepository>,
        todos: Arc<dyn TodoRepository>,
        db: Option<PgPool>,
    ) -> Self {
        let jwt_service = JwtService::new(JwtConfig::from_config(config));

        Self {
            auth: AuthService::new(users, jwt_service, config.bcrypt_cost),
            todos: TodoService::new(todos),
            db,
        }
    }

    /// State backed by PostgreSQL
    pub fn postgres(config: &Config, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgTodoRepository::new(pool.clone())),
            Some(pool),
        )
    }

    /// State backed by process memory; nothing survives a restart
    pub fn in_memory(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryTodoRepository::new()),
            None,
        )
    }
}

/// Health check payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub store: String,
}

/// GET /api/health
async fn health_handler(
    State(db): State<Option<PgPool>>,
) -> Result<Json<ApiResponse<HealthStatus>>, ApiError> {
    let store = match db {
        Some(pool) => {
            if let Err(e) = health_check(&pool).await {
                tracing::error!("Database health check failed: {}", e);
                return Err(ApiError::new(
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    "Database unavailable",
                ));
            }
            "postgres"
        }
        None => "memory",
    };

    Ok(Json(ApiResponse::ok(HealthStatus {
        status: "ok".to_string(),
        store: store.to_string(),
    })))
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidValue {
                name: "CORS_ORIGIN",
                value: origin.to_string(),
            })?;
            Ok(layer.allow_origin(value))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

/// Build the full application router
pub fn build_router(state: AppState, config: &Config) -> Result<Router, ConfigError> {
    let cors = cors_layer(config.cors_origin.as_deref())?;

    Ok(Router::new()
        .route("/api/health", get(health_handler))
        .merge(auth_api_router())
        .merge(todo_api_router())
        .fallback(not_found_handler)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
