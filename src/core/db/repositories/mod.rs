//! Database repositories for todoapp
//!
//! Repositories encapsulate data access behind traits so the services work the same
//! against PostgreSQL and the in-memory store.

pub mod memory;
pub mod todo;
pub mod user;

pub use memory::{InMemoryTodoRepository, InMemoryUserRepository};
pub use todo::{PgTodoRepository, TodoRepository, TodoRepositoryError};
pub use user::{PgUserRepository, UserRepository, UserRepositoryError};
