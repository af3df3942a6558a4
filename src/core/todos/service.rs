//! Todo service
//!
//! Every operation takes the caller's id and only ever touches that caller's
//! todos. A todo owned by someone else is reported exactly like a missing one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::db::models::{CreateTodo, Priority, Todo, UpdateTodo};
use crate::core::db::repositories::{TodoRepository, TodoRepositoryError};
use crate::core::validation::{
    FieldError, Validator, parse_priority, validate_description, validate_title,
};

/// Todo service error types
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Todo not found")]
    NotFound,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<TodoRepositoryError> for TodoError {
    fn from(err: TodoRepositoryError) -> Self {
        match err {
            TodoRepositoryError::DatabaseError(e) => TodoError::InternalError(e.to_string()),
        }
    }
}

/// Create todo request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

/// Path ids that are not UUIDs cannot name any todo
pub fn parse_todo_id(raw: &str) -> Result<Uuid, TodoError> {
    Uuid::parse_str(raw).map_err(|_| TodoError::NotFound)
}

#[derive(Clone)]
pub struct TodoService {
    todos: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoRepository>) -> Self {
        Self { todos }
    }

    /// All todos of the owner, newest first
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Todo>, TodoError> {
        Ok(self.todos.list_by_owner(owner_id).await?)
    }

    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Todo, TodoError> {
        self.todos
            .find_by_id_and_owner(id, owner_id)
            .await?
            .ok_or(TodoError::NotFound)
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        request: CreateTodoRequest,
    ) -> Result<Todo, TodoError> {
        let mut validator = Validator::new();
        let title = validator.check(validate_title(&request.title));
        let description = validator.check(validate_description(request.description.as_deref()));
        let priority = match request.priority.as_deref() {
            Some(raw) => validator.check(parse_priority(raw)),
            None => Some(Priority::default()),
        };
        validator.finish().map_err(TodoError::Validation)?;

        let (Some(title), Some(description), Some(priority)) = (title, description, priority)
        else {
            return Err(TodoError::InternalError(
                "validated fields missing".to_string(),
            ));
        };

        let todo = self
            .todos
            .create(&CreateTodo {
                owner_id,
                title,
                description,
                priority,
            })
            .await?;

        Ok(todo)
    }

    /// Apply a partial update
    ///
    /// Absent fields are left as they are; `description: null` clears the description.
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: UpdateTodo,
    ) -> Result<Todo, TodoError> {
        let mut todo = self.get(id, owner_id).await?;

        let mut validator = Validator::new();
        if let Some(title) = changes.title.as_deref()
            && let Some(title) = validator.check(validate_title(title))
        {
            todo.title = title;
        }
        if let Some(description) = changes.description
            && let Some(description) = validator.check(validate_description(description.as_deref()))
        {
            todo.description = description;
        }
        if let Some(priority) = changes.priority.as_deref()
            && let Some(priority) = validator.check(parse_priority(priority))
        {
            todo.priority = priority;
        }
        if let Some(completed) = changes.completed {
            todo.completed = completed;
        }
        validator.finish().map_err(TodoError::Validation)?;

        self.todos.save(&todo).await?.ok_or(TodoError::NotFound)
    }

    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<(), TodoError> {
        self.get(id, owner_id).await?;

        if self.todos.delete(id, owner_id).await? {
            Ok(())
        } else {
            Err(TodoError::NotFound)
        }
    }

    /// Flip `completed` and persist
    pub async fn toggle(&self, id: Uuid, owner_id: Uuid) -> Result<Todo, TodoError> {
        let mut todo = self.get(id, owner_id).await?;
        todo.completed = !todo.completed;

        self.todos.save(&todo).await?.ok_or(TodoError::NotFound)
    }
}
