//! Todo API endpoints
//!
//! All routes require a bearer token:
//! - GET /api/todos - List the caller's todos
//! - POST /api/todos - Create a todo
//! - GET /api/todos/{id} - Get a todo
//! - PUT /api/todos/{id} - Update a todo
//! - DELETE /api/todos/{id} - Delete a todo
//! - PATCH /api/todos/{id}/toggle - Flip the completed flag

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};

use crate::app::AppState;
use crate::core::api::{ApiError, ApiJson, ApiResponse};
use crate::core::auth::AuthUser;
use crate::core::db::models::{Todo, UpdateTodo};
use crate::core::todos::service::{CreateTodoRequest, TodoError, TodoService, parse_todo_id};

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound => ApiError::not_found(err.to_string()),
            TodoError::Validation(errors) => ApiError::validation(errors),
            TodoError::InternalError(detail) => {
                tracing::error!("Todo store failure: {}", detail);
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Create the todo API router
pub fn todo_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/todos", get(list_todos_handler).post(create_todo_handler))
        .route(
            "/api/todos/{id}",
            get(get_todo_handler)
                .put(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .route("/api/todos/{id}/toggle", patch(toggle_todo_handler))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_todos_handler(
    State(todos): State<TodoService>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Todo>>>, ApiError> {
    let list = todos.list(user.id).await?;
    tracing::debug!("Listed {} todos for user {}", list.len(), user.id);

    let count = list.len();
    Ok(Json(ApiResponse::ok(list).with_count(count)))
}

async fn create_todo_handler(
    State(todos): State<TodoService>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Todo>>), ApiError> {
    let todo = todos.create(user.id, request).await?;

    tracing::info!("Todo {} created by user {}", todo.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(todo).with_message("Todo created successfully")),
    ))
}

async fn get_todo_handler(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Todo>>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = todos.get(id, user.id).await?;
    Ok(Json(ApiResponse::ok(todo)))
}

async fn update_todo_handler(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<UpdateTodo>,
) -> Result<Json<ApiResponse<Todo>>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = todos.update(id, user.id, changes).await?;

    tracing::info!("Todo {} updated by user {}", todo.id, user.id);

    Ok(Json(
        ApiResponse::ok(todo).with_message("Todo updated successfully"),
    ))
}

async fn delete_todo_handler(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_todo_id(&id)?;
    todos.delete(id, user.id).await?;

    tracing::info!("Todo {} deleted by user {}", id, user.id);

    Ok(Json(ApiResponse::message("Todo deleted successfully")))
}

async fn toggle_todo_handler(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Todo>>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = todos.toggle(id, user.id).await?;

    let message = if todo.completed {
        "Todo marked as completed"
    } else {
        "Todo marked as incomplete"
    };

    Ok(Json(ApiResponse::ok(todo).with_message(message)))
}
