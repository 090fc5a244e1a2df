//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug)]
struct Inner {
    users: BTreeMap<UserId, User>,
    next_id: i64,
}

/// In-memory implementation of UserRepository.
///
/// Ids are assigned sequentially from 1, like a `BIGSERIAL` column.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                users: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Stored password for a user, as the store holds it
    pub async fn stored_password(&self, id: UserId) -> Option<String> {
        let inner = self.inner.read().await;
        inner.users.get(&id).map(|u| u.password.clone())
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, mut user: User) -> Result<User, DomainError> {
        let mut inner = self.inner.write().await;

        user.id = UserId::new(inner.next_id);
        inner.next_id += 1;
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut inner = self.inner.write().await;

        let stored = inner
            .users
            .get_mut(&user.id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user.id)))?;

        stored.username = user.username.clone();
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.email = user.email.clone();

        Ok(user)
    }

    async fn update_password(&self, user: &User) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;

        let stored = inner
            .users
            .get_mut(&user.id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user.id)))?;

        stored.password = user.password.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, DomainError> {
        let inner = self.inner.read().await;

        inner
            .users
            .get(&id)
            .map(User::without_password)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().map(User::without_password).collect())
    }
}
