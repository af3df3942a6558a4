//! Database module for todoapp
//!
//! Connectivity, models, and repositories for the user and todo stores.

pub mod models;
pub mod pool;
pub mod repositories;

pub use models::*;
pub use pool::{DbConfig, DbError, create_pool, create_pool_with_migrations, health_check};
pub use repositories::{
    InMemoryTodoRepository, InMemoryUserRepository, PgTodoRepository, PgUserRepository,
    TodoRepository, TodoRepositoryError, UserRepository, UserRepositoryError,
};

pub use sqlx::PgPool;
