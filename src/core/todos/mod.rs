//! Todo management module
//!
//! Owner-scoped CRUD over todo items plus the completion toggle.

pub mod api;
pub mod service;

pub use api::todo_api_router;
pub use service::{CreateTodoRequest, TodoError, TodoService, parse_todo_id};
