//! In-memory repositories
//!
//! Used when no `DATABASE_URL` is configured and throughout the test suite.
//! Data lives only as long as the process.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::core::db::models::{CreateTodo, CreateUser, Todo, User};
use crate::core::db::repositories::{
    TodoRepository, TodoRepositoryError, UserRepository, UserRepositoryError,
};

// ============================================================================
// Users
// ============================================================================

/// User store keyed by id, with email/username indexes that double as uniqueness claims
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
    usernames: DashMap<String, Uuid>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &CreateUser) -> Result<User, UserRepositoryError> {
        let id = Uuid::new_v4();

        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(UserRepositoryError::EmailAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                self.emails.remove(&user.email);
                return Err(UserRepositoryError::UsernameAlreadyExists);
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let record = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, record.clone());

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let id = self.emails.get(email).map(|e| *e.value());
        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let id = self.usernames.get(username).map(|e| *e.value());
        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }
}

// ============================================================================
// Todos
// ============================================================================

struct StoredTodo {
    /// Insertion order, breaks ties between equal `created_at` values
    seq: u64,
    todo: Todo,
}

/// Todo store keyed by id
#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: DashMap<Uuid, StoredTodo>,
    next_seq: AtomicU64,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Todo>, TodoRepositoryError> {
        let mut owned: Vec<(u64, Todo)> = self
            .todos
            .iter()
            .filter(|entry| entry.todo.owner_id == owner_id)
            .map(|entry| (entry.seq, entry.todo.clone()))
            .collect();

        owned.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        Ok(owned.into_iter().map(|(_, todo)| todo).collect())
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Todo>, TodoRepositoryError> {
        Ok(self
            .todos
            .get(&id)
            .filter(|entry| entry.todo.owner_id == owner_id)
            .map(|entry| entry.todo.clone()))
    }

    async fn create(&self, todo: &CreateTodo) -> Result<Todo, TodoRepositoryError> {
        let now = Utc::now();
        let record = Todo {
            id: Uuid::new_v4(),
            owner_id: todo.owner_id,
            title: todo.title.clone(),
            description: todo.description.clone(),
            priority: todo.priority,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.todos.insert(
            record.id,
            StoredTodo {
                seq,
                todo: record.clone(),
            },
        );

        Ok(record)
    }

    async fn save(&self, todo: &Todo) -> Result<Option<Todo>, TodoRepositoryError> {
        let Some(mut entry) = self.todos.get_mut(&todo.id) else {
            return Ok(None);
        };
        if entry.todo.owner_id != todo.owner_id {
            return Ok(None);
        }

        let stored = &mut entry.todo;
        stored.title = todo.title.clone();
        stored.description = todo.description.clone();
        stored.priority = todo.priority;
        stored.completed = todo.completed;
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, TodoRepositoryError> {
        Ok(self
            .todos
            .remove_if(&id, |_, entry| entry.todo.owner_id == owner_id)
            .is_some())
    }
}
