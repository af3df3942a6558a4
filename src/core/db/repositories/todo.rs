//! Todo repository
//!
//! Every lookup and write is keyed by both the todo id and the owner id, so a todo
//! owned by someone else behaves exactly like one that does not exist.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateTodo, Todo};

/// Todo repository error types
#[derive(Debug, thiserror::Error)]
pub enum TodoRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Owner-scoped storage operations over todo records
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All todos of one owner, newest first
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Todo>, TodoRepositoryError>;

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Todo>, TodoRepositoryError>;

    async fn create(&self, todo: &CreateTodo) -> Result<Todo, TodoRepositoryError>;

    /// Persist the mutable fields of `todo`; `None` if it is gone or not owned by `todo.owner_id`
    async fn save(&self, todo: &Todo) -> Result<Option<Todo>, TodoRepositoryError>;

    /// Returns `false` when nothing matched
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, TodoRepositoryError>;
}

/// PostgreSQL-backed todo repository
#[derive(Clone)]
pub struct PgTodoRepository {
    pool: PgPool,
}

impl PgTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Todo>, TodoRepositoryError> {
        let todos = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, title, description, priority, completed, created_at, updated_at
            FROM todos
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(todos)
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Todo>, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, title, description, priority, completed, created_at, updated_at
            FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(todo)
    }

    async fn create(&self, todo: &CreateTodo) -> Result<Todo, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (owner_id, title, description, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, title, description, priority, completed, created_at, updated_at
            "#,
        )
        .bind(todo.owner_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.priority)
        .fetch_one(&self.pool)
        .await?;

        Ok(todo)
    }

    async fn save(&self, todo: &Todo) -> Result<Option<Todo>, TodoRepositoryError> {
        let saved = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET
                title = $3,
                description = $4,
                priority = $5,
                completed = $6,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, priority, completed, created_at, updated_at
            "#,
        )
        .bind(todo.id)
        .bind(todo.owner_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.priority)
        .bind(todo.completed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, TodoRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
