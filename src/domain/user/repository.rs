//! User repository trait

use async_trait::async_trait;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Repository trait for user storage.
///
/// Implementations report a missing row (zero rows affected or returned) as
/// `DomainError::NotFound` and every other failure as a different variant.
/// Reads never return the password.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; the store assigns and returns the id
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update username, first name, last name and email of an existing user
    async fn update(&self, user: User) -> Result<User, DomainError>;

    /// Update only the password of an existing user
    async fn update_password(&self, user: &User) -> Result<(), DomainError>;

    /// Get a user by id
    async fn find_by_id(&self, id: UserId) -> Result<User, DomainError>;

    /// List all users in store order; empty when there are none
    async fn find_all(&self) -> Result<Vec<User>, DomainError>;
}
